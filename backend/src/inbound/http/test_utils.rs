//! Test helpers for inbound HTTP components.
//!
//! [`TestWorld`] wires [`HttpState`] over the in-memory adapters and a fixed
//! token table, and keeps handles on the stores so tests can seed and inspect
//! them directly.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::Utc;
use mockable::DefaultClock;
use serde_json::Value;

use crate::domain::ports::{
    AdminProfileRepository, BlobStore, ContentRepository, FixtureIdentityProvider,
    FixturePaymentVerifier, UserProfileRepository,
};
use crate::domain::{
    AdminProfile, BlobName, ContentItem, ContentItemId, IdentityClaim, Price, SubjectId,
    UserProfile,
};
use crate::outbound::memory::{
    InMemoryBlobStore, InMemoryContentRepository, InMemoryMemberSequence, InMemoryProfileStore,
    InMemoryPurchaseRepository,
};

use super::configure_api;
use super::state::{HttpState, HttpStatePorts};

pub const MEMBER_SUBJECT: &str = "member-1";
pub const MEMBER_EMAIL: &str = "member1@example.edu";
pub const ADMIN_SUBJECT: &str = "admin-1";
pub const ADMIN_EMAIL: &str = "librarian@example.edu";

pub fn member_token() -> &'static str {
    "member-token"
}

pub fn admin_token() -> &'static str {
    "admin-token"
}

/// `Authorization` header pair for `token`.
pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn subject(raw: &str) -> SubjectId {
    SubjectId::new(raw).expect("valid subject")
}

pub struct TestWorld {
    pub profiles: Arc<InMemoryProfileStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub items: Arc<InMemoryContentRepository>,
    pub purchases: Arc<InMemoryPurchaseRepository>,
    state: web::Data<HttpState>,
}

impl TestWorld {
    pub fn new() -> Self {
        let identity = FixtureIdentityProvider::default()
            .with_token(
                member_token(),
                IdentityClaim::new(subject(MEMBER_SUBJECT))
                    .with_display_name("Member One")
                    .with_email(MEMBER_EMAIL),
            )
            .with_token(
                admin_token(),
                IdentityClaim::new(subject(ADMIN_SUBJECT))
                    .with_display_name("Head Librarian")
                    .with_email(ADMIN_EMAIL),
            );
        let profiles = Arc::new(InMemoryProfileStore::new());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let items = Arc::new(InMemoryContentRepository::new());
        let purchases = Arc::new(InMemoryPurchaseRepository::new());
        let state = HttpState::new(HttpStatePorts {
            identity: Arc::new(identity),
            users: profiles.clone(),
            admins: profiles.clone(),
            sequence: Arc::new(InMemoryMemberSequence::new()),
            blobs: blobs.clone(),
            items: items.clone(),
            purchases: purchases.clone(),
            payments: Arc::new(FixturePaymentVerifier),
            clock: Arc::new(DefaultClock),
        });
        Self {
            profiles,
            blobs,
            items,
            purchases,
            state: web::Data::new(state),
        }
    }

    pub fn state(&self) -> web::Data<HttpState> {
        self.state.clone()
    }

    /// Insert a completed student profile for `raw`, adjusted by `edit`.
    pub async fn seed_member(&self, raw: &str, edit: impl FnOnce(&mut UserProfile)) -> UserProfile {
        let mut profile = UserProfile::new(subject(raw), Utc::now());
        profile.display_name = "Member One".to_owned();
        profile.email = Some(format!("{raw}@example.edu"));
        edit(&mut profile);
        UserProfileRepository::insert(self.profiles.as_ref(), &profile)
            .await
            .expect("seed member");
        profile
    }

    pub async fn seed_admin(&self, raw: &str) -> AdminProfile {
        let profile = AdminProfile {
            subject: subject(raw),
            email: ADMIN_EMAIL.to_owned(),
            display_name: "Head Librarian".to_owned(),
            elevation_key_used: None,
            created_at: Utc::now(),
        };
        AdminProfileRepository::insert(self.profiles.as_ref(), &profile)
            .await
            .expect("seed admin");
        profile
    }

    pub async fn seed_blob(&self, raw: &str, content: &[u8]) -> BlobName {
        let name = BlobName::new(raw).expect("valid blob name");
        self.blobs
            .save(&name, content.to_vec(), None)
            .await
            .expect("seed blob")
    }

    /// Insert a catalogue item, adjusted by `edit`.
    pub async fn seed_item(&self, edit: impl FnOnce(&mut ContentItem)) -> ContentItem {
        let mut item = ContentItem {
            id: ContentItemId::random(),
            title: "Distributed Systems".to_owned(),
            author: "M. van Steen".to_owned(),
            description: None,
            department: Some("CSE".to_owned()),
            semester: Some("5".to_owned()),
            premium: false,
            price: Price::from_minor_units(0),
            featured: false,
            cover: None,
            document: None,
            uploaded_by: Some(subject(ADMIN_SUBJECT)),
            uploaded_at: Utc::now(),
        };
        edit(&mut item);
        self.items.insert(&item).await.expect("seed item");
        item
    }

    /// Run `req` through the full API and decode the JSON reply.
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn send(&self, req: test::TestRequest) -> (StatusCode, Value) {
        let (status, body) = self.send_raw(req).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("JSON body")
        };
        (status, value)
    }

    /// Run `req` through the full API and return the raw body.
    pub async fn send_raw(&self, req: test::TestRequest) -> (StatusCode, Vec<u8>) {
        let app =
            test::init_service(App::new().app_data(self.state()).configure(configure_api)).await;
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        (status, test::read_body(res).await.to_vec())
    }

    pub async fn member(&self, raw: &str) -> Option<UserProfile> {
        UserProfileRepository::find(self.profiles.as_ref(), &subject(raw))
            .await
            .expect("profile lookup")
    }
}
