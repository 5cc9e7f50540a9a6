//! Concurrent registration and interleaved account writes against the
//! in-memory adapters.

#[path = "support/library.rs"]
mod library;

use std::collections::HashSet;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use library::{Library, bearer, member_token};
use library_backend::domain::ports::{
    FixtureIdentityProvider, MemberSequence, UserProfileRepository,
};
use library_backend::domain::{
    AccountAdministration, AdminProfile, Department, IdentityClaim, IdentityContext,
    ProfileRecord, ProofReview, ProofStatus, ProofUpload, RegistrationService, SubjectId,
    UserRegistration,
};
use library_backend::outbound::memory::{
    InMemoryBlobStore, InMemoryContentRepository, InMemoryMemberSequence, InMemoryProfileStore,
    InMemoryPurchaseRepository,
};
use mockable::DefaultClock;

fn claim(n: usize) -> IdentityClaim {
    IdentityClaim::new(SubjectId::new(format!("member-{n}")).expect("subject"))
}

fn registration(n: usize) -> UserRegistration {
    UserRegistration {
        display_name: format!("Member {n}"),
        email: format!("member{n}@example.edu"),
        mobile: "9000000000".to_owned(),
        department: "cse".to_owned(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_get_distinct_member_ids() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let sequence = Arc::new(InMemoryMemberSequence::new());
    let service = Arc::new(RegistrationService::new(
        profiles.clone(),
        profiles.clone(),
        sequence.clone(),
        Arc::new(InMemoryBlobStore::default()),
        Arc::new(DefaultClock),
    ));

    let handles: Vec<_> = (1..=32)
        .map(|n| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register_user(&claim(n), registration(n)).await })
        })
        .collect();
    let mut ids = HashSet::new();
    for handle in handles {
        let profile = handle.await.expect("join").expect("registered");
        let id = profile.member_id.expect("member id");
        assert!(ids.insert(id.as_ref().to_owned()), "duplicate id {}", id.as_ref());
    }

    assert_eq!(ids.len(), 32);
    assert!(ids.contains("CSE001"));
    assert!(ids.contains("CSE032"));
    let seventh = SubjectId::new("member-7").expect("subject");
    let stored = UserProfileRepository::find(profiles.as_ref(), &seventh)
        .await
        .expect("lookup")
        .expect("profile");
    assert!(stored.member_id.is_some());
    let cse = Department::new("CSE").expect("department");
    assert_eq!(sequence.next(&cse).await.expect("next"), 33);
}

#[actix_web::test]
async fn sync_is_idempotent_across_requests() {
    let library = Library::new(1);
    let sync = || {
        TestRequest::post()
            .uri("/api/v1/users/sync")
            .insert_header(bearer(&member_token(1)))
    };

    let (first_status, first) = library.json(sync()).await;
    let (second_status, second) = library.json(sync()).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first["uid"], "member-1");
    assert_eq!(first["email"], "member1@example.edu");
}

#[actix_web::test]
async fn the_same_subject_cannot_register_twice() {
    let library = Library::new(1);
    library.register_member(1, "cse").await;

    let (status, body) = library
        .json(
            TestRequest::post()
                .uri("/api/v1/users/register")
                .insert_header(bearer(&member_token(1)))
                .set_json(serde_json::json!({
                    "name": "Member 1",
                    "email": "member1@example.edu",
                    "mobile": "9000000000",
                    "department": "ece"
                })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

struct Accounts {
    profiles: Arc<InMemoryProfileStore>,
    registration: RegistrationService,
    admin: AccountAdministration,
}

fn accounts() -> Accounts {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let registration = RegistrationService::new(
        profiles.clone(),
        profiles.clone(),
        Arc::new(InMemoryMemberSequence::new()),
        Arc::new(InMemoryBlobStore::default()),
        Arc::new(DefaultClock),
    );
    let admin = AccountAdministration::new(
        profiles.clone(),
        Arc::new(InMemoryContentRepository::new()),
        Arc::new(InMemoryPurchaseRepository::new()),
        Arc::new(FixtureIdentityProvider::default()),
        Arc::new(DefaultClock),
    );
    Accounts {
        profiles,
        registration,
        admin,
    }
}

fn administrator() -> IdentityContext {
    let subject = SubjectId::new("admin-1").expect("subject");
    IdentityContext::administrator(
        IdentityClaim::new(subject.clone()),
        AdminProfile {
            subject,
            email: "librarian@example.edu".to_owned(),
            display_name: "Head Librarian".to_owned(),
            elevation_key_used: None,
            created_at: chrono::Utc::now(),
        },
    )
}

fn proof(name: &str) -> ProofUpload {
    ProofUpload {
        file_name: name.to_owned(),
        content: b"%PDF-1.7".to_vec(),
        content_type: Some("application/pdf".to_owned()),
    }
}

/// Context built from the record as it stood when a request began.
async fn member_context(accounts: &Accounts, n: usize) -> IdentityContext {
    let subject = claim(n).subject().clone();
    let profile = UserProfileRepository::find(accounts.profiles.as_ref(), &subject)
        .await
        .expect("lookup")
        .expect("profile");
    IdentityContext::member(claim(n), profile)
}

#[tokio::test]
async fn a_suspension_issued_during_a_proof_upload_sticks() {
    let accounts = accounts();
    accounts
        .registration
        .register_user(&claim(1), registration(1))
        .await
        .expect("registered");
    let in_flight = member_context(&accounts, 1).await;

    accounts
        .admin
        .set_suspension(&administrator(), claim(1).subject(), true)
        .await
        .expect("suspended");
    accounts
        .registration
        .upload_proof(&in_flight, proof("card.pdf"))
        .await
        .expect("uploaded");

    let stored = UserProfileRepository::find(accounts.profiles.as_ref(), claim(1).subject())
        .await
        .expect("lookup")
        .expect("profile");
    assert!(stored.is_suspended());
    assert!(stored.proof.file.is_some());
}

#[tokio::test]
async fn a_review_verdict_survives_a_later_sync() {
    let accounts = accounts();
    accounts
        .registration
        .register_user(&claim(2), registration(2))
        .await
        .expect("registered");
    let ctx = member_context(&accounts, 2).await;
    accounts
        .registration
        .upload_proof(&ctx, proof("card.pdf"))
        .await
        .expect("uploaded");
    accounts
        .admin
        .review_proof(&administrator(), claim(2).subject(), ProofReview::Verified)
        .await
        .expect("reviewed");

    let synced = accounts
        .registration
        .sync_profile(&claim(2).with_display_name("Renamed"))
        .await
        .expect("synced");

    let ProfileRecord::User(profile) = synced else {
        panic!("expected a member record");
    };
    assert!(matches!(profile.proof.status, ProofStatus::Verified { .. }));
    assert_eq!(profile.display_name, "Member 2");
}
