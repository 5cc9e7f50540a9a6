//! Full-application harness shared by the HTTP integration tests.
//!
//! Builds the same app the binary serves (trace middleware, `/api/v1` scope
//! and health checks) over in-memory adapters and a fixed token table.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use mockable::DefaultClock;
use serde_json::Value;

use library_backend::Trace;
use library_backend::domain::ports::{FixtureIdentityProvider, FixturePaymentVerifier};
use library_backend::domain::{IdentityClaim, SubjectId};
use library_backend::inbound::http::configure_api;
use library_backend::inbound::http::health::{HealthState, live, ready};
use library_backend::inbound::http::state::{HttpState, HttpStatePorts};
use library_backend::outbound::memory::{
    InMemoryBlobStore, InMemoryContentRepository, InMemoryMemberSequence, InMemoryProfileStore,
    InMemoryPurchaseRepository,
};

pub const ADMIN_TOKEN: &str = "admin-token";

/// Token accepted for member `n`.
pub fn member_token(n: usize) -> String {
    format!("member-{n}-token")
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

/// Identity provider that knows one administrator and `members` members.
fn identity(members: usize) -> FixtureIdentityProvider {
    let admin = IdentityClaim::new(SubjectId::new("admin-1").expect("subject"))
        .with_display_name("Head Librarian")
        .with_email("librarian@example.edu");
    (1..=members).fold(
        FixtureIdentityProvider::default().with_token(ADMIN_TOKEN, admin),
        |provider, n| {
            let claim = IdentityClaim::new(SubjectId::new(format!("member-{n}")).expect("subject"))
                .with_display_name(format!("Member {n}"))
                .with_email(format!("member{n}@example.edu"));
            provider.with_token(member_token(n), claim)
        },
    )
}

pub struct Library {
    state: web::Data<HttpState>,
    health: web::Data<HealthState>,
}

impl Library {
    pub fn new(members: usize) -> Self {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let state = HttpState::new(HttpStatePorts {
            identity: Arc::new(identity(members)),
            users: profiles.clone(),
            admins: profiles,
            sequence: Arc::new(InMemoryMemberSequence::new()),
            blobs: Arc::new(InMemoryBlobStore::default()),
            items: Arc::new(InMemoryContentRepository::new()),
            purchases: Arc::new(InMemoryPurchaseRepository::new()),
            payments: Arc::new(FixturePaymentVerifier),
            clock: Arc::new(DefaultClock),
        });
        let health = HealthState::new();
        health.mark_ready();
        Self {
            state: web::Data::new(state),
            health: web::Data::new(health),
        }
    }

    /// Send `req` through the full app and return status, headers and raw body.
    pub async fn call(&self, req: TestRequest) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let app = test::init_service(
            App::new()
                .app_data(self.state.clone())
                .app_data(self.health.clone())
                .wrap(Trace)
                .configure(configure_api)
                .service(ready)
                .service(live),
        )
        .await;
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let headers = res.headers().clone();
        (status, headers, test::read_body(res).await.to_vec())
    }

    /// Send `req` and decode the JSON body (`Null` when empty).
    pub async fn json(&self, req: TestRequest) -> (StatusCode, Value) {
        let (status, _, body) = self.call(req).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("JSON body")
        };
        (status, value)
    }

    pub async fn register_admin(&self) {
        let (status, _) = self
            .json(
                TestRequest::post()
                    .uri("/api/v1/admin/register")
                    .insert_header(bearer(ADMIN_TOKEN))
                    .set_json(serde_json::json!({
                        "name": "Head Librarian",
                        "email": "librarian@example.edu"
                    })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    /// Register member `n` in `department` and return the reply body.
    pub async fn register_member(&self, n: usize, department: &str) -> Value {
        let (status, body) = self
            .json(
                TestRequest::post()
                    .uri("/api/v1/users/register")
                    .insert_header(bearer(&member_token(n)))
                    .set_json(serde_json::json!({
                        "name": format!("Member {n}"),
                        "email": format!("member{n}@example.edu"),
                        "mobile": "9000000000",
                        "department": department
                    })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn upload_proof(&self, n: usize) -> String {
        let (status, body) = self
            .json(
                TestRequest::post()
                    .uri("/api/v1/users/me/id-proof?filename=card.pdf")
                    .insert_header(bearer(&member_token(n)))
                    .insert_header((header::CONTENT_TYPE, "application/pdf"))
                    .set_payload("%PDF-1.7 member card"),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["url"].as_str().expect("proof url").to_owned()
    }

    /// Create a catalogue item as the administrator and return its id.
    pub async fn create_book(&self, title: &str, premium: bool, price: u64) -> String {
        let (status, body) = self
            .json(
                TestRequest::post()
                    .uri("/api/v1/books")
                    .insert_header(bearer(ADMIN_TOKEN))
                    .set_json(serde_json::json!({
                        "title": title,
                        "author": "Library Press",
                        "department": "CSE",
                        "premium": premium,
                        "price": price
                    })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("book id").to_owned()
    }

    pub async fn access(&self, book: &str, token: Option<&str>) -> Value {
        let mut req = TestRequest::get().uri(&format!("/api/v1/books/{book}/access"));
        if let Some(token) = token {
            req = req.insert_header(bearer(token));
        }
        let (status, body) = self.json(req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}
