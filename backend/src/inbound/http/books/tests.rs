//! Tests for catalogue and purchase handlers.

use crate::domain::ports::BlobStore;
use crate::domain::{BlobName, ContentItem, Price};
use crate::inbound::http::test_utils::{
    ADMIN_SUBJECT, MEMBER_SUBJECT, TestWorld, admin_token, bearer, member_token,
};
use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::test::TestRequest;
use rstest::rstest;
use serde_json::json;

fn premium(item: &mut ContentItem) {
    item.premium = true;
    item.price = Price::from_minor_units(49_900);
}

/// Seed the member with a stored proof document.
async fn member_with_proof(world: &TestWorld) {
    let proof = world.seed_blob("id-proofs/member-1_card.pdf", b"%PDF").await;
    world
        .seed_member(MEMBER_SUBJECT, |profile| profile.proof.file = Some(proof))
        .await;
}

fn access(id: &str, token: Option<&str>) -> TestRequest {
    let req = TestRequest::get().uri(&format!("/api/v1/books/{id}/access"));
    match token {
        Some(token) => req.insert_header(bearer(token)),
        None => req,
    }
}

fn payment(id: &str) -> TestRequest {
    TestRequest::post()
        .uri(&format!("/api/v1/books/{id}/verify-payment"))
        .insert_header(bearer(member_token()))
        .set_json(json!({ "paymentId": "pay_1", "orderId": "order_1", "signature": "sig" }))
}

#[actix_web::test]
async fn administrators_create_items() {
    let world = TestWorld::new();
    world.seed_admin(ADMIN_SUBJECT).await;

    let (status, body) = world
        .send(
            TestRequest::post()
                .uri("/api/v1/books")
                .insert_header(bearer(admin_token()))
                .set_json(json!({
                    "title": "Compilers",
                    "author": "A. Aho",
                    "premium": false,
                    "price": 1200
                })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Compilers");
    assert_eq!(body["price"], 0);
    assert_eq!(body["uploadedBy"], ADMIN_SUBJECT);
    assert!(body["coverUrl"].is_null());
}

#[rstest]
#[case(Some("member"), StatusCode::FORBIDDEN)]
#[case(None, StatusCode::UNAUTHORIZED)]
#[actix_web::test]
async fn only_administrators_create_items(
    #[case] token: Option<&str>,
    #[case] expected: StatusCode,
) {
    let world = TestWorld::new();
    world.seed_member(MEMBER_SUBJECT, |_| {}).await;
    let mut req = TestRequest::post()
        .uri("/api/v1/books")
        .set_json(json!({ "title": "Compilers", "author": "A. Aho" }));
    if token.is_some() {
        req = req.insert_header(bearer(member_token()));
    }

    let (status, _) = world.send(req).await;

    assert_eq!(status, expected);
}

#[actix_web::test]
async fn missing_proof_outranks_free_items() {
    let world = TestWorld::new();
    world.seed_member(MEMBER_SUBJECT, |_| {}).await;
    let item = world.seed_item(|_| {}).await;

    let (status, body) = world
        .send(access(&item.id.to_string(), Some(member_token())))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "allowed": false, "reason": "missing_id_proof" }));
}

#[actix_web::test]
async fn proof_reference_without_a_stored_blob_counts_as_missing() {
    let world = TestWorld::new();
    world
        .seed_member(MEMBER_SUBJECT, |profile| {
            profile.proof.file = Some(
                BlobName::new("id-proofs/member-1_gone.pdf").expect("blob name"),
            );
        })
        .await;
    let item = world.seed_item(|_| {}).await;

    let (_, body) = world
        .send(access(&item.id.to_string(), Some(member_token())))
        .await;

    assert_eq!(body["reason"], "missing_id_proof");
}

#[rstest]
#[case::anonymous(false)]
#[case::member_with_proof(true)]
#[actix_web::test]
async fn free_items_are_open(#[case] signed_in: bool) {
    let world = TestWorld::new();
    member_with_proof(&world).await;
    let item = world.seed_item(|_| {}).await;
    let token = signed_in.then(member_token);

    let (_, body) = world.send(access(&item.id.to_string(), token)).await;

    assert_eq!(body, json!({ "allowed": true, "reason": "free" }));
}

#[actix_web::test]
async fn premium_items_open_after_a_verified_purchase() {
    let world = TestWorld::new();
    member_with_proof(&world).await;
    let item = world.seed_item(premium).await;
    let id = item.id.to_string();

    let (_, before) = world.send(access(&id, Some(member_token()))).await;
    let (status, purchase) = world.send(payment(&id)).await;
    let (_, after) = world.send(access(&id, Some(member_token()))).await;

    assert_eq!(before, json!({ "allowed": false, "reason": "not-purchased" }));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(purchase["success"], true);
    assert_eq!(purchase["purchase"]["itemId"], id);
    assert_eq!(purchase["purchase"]["amount"], 49_900);
    assert_eq!(purchase["purchase"]["transactionRef"], "pay_1");
    assert_eq!(after, json!({ "allowed": true, "reason": "purchased" }));
}

#[actix_web::test]
async fn anonymous_callers_have_not_purchased_premium_items() {
    let world = TestWorld::new();
    let item = world.seed_item(premium).await;

    let (_, body) = world.send(access(&item.id.to_string(), None)).await;

    assert_eq!(body, json!({ "allowed": false, "reason": "not-purchased" }));
}

#[actix_web::test]
async fn repeated_purchase_conflicts() {
    let world = TestWorld::new();
    member_with_proof(&world).await;
    let item = world.seed_item(premium).await;
    let id = item.id.to_string();

    let (first, _) = world.send(payment(&id)).await;
    let (second, body) = world.send(payment(&id)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["details"]["code"], "duplicate_purchase");
}

#[actix_web::test]
async fn blank_payment_ids_are_refused() {
    let world = TestWorld::new();
    member_with_proof(&world).await;
    let item = world.seed_item(premium).await;

    let (status, body) = world
        .send(
            TestRequest::post()
                .uri(&format!("/api/v1/books/{}/verify-payment", item.id))
                .insert_header(bearer(member_token()))
                .set_json(json!({ "paymentId": " ", "orderId": "order_1" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "missing_payment_details");
}

#[rstest]
#[case("not-a-uuid")]
#[case("6f1f8c1e-0000-4000-8000-000000000000")]
#[actix_web::test]
async fn unknown_items_are_not_found(#[case] id: &str) {
    let world = TestWorld::new();

    let (status, body) = world
        .send(TestRequest::get().uri(&format!("/api/v1/books/{id}")))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[actix_web::test]
async fn details_report_locators_and_access() {
    let world = TestWorld::new();
    member_with_proof(&world).await;
    let cover = world.seed_blob("books/covers/cover.png", b"png").await;
    let item = world
        .seed_item(|item| {
            premium(item);
            item.cover = Some(cover);
        })
        .await;

    let (status, body) = world
        .send(
            TestRequest::get()
                .uri(&format!("/api/v1/books/{}", item.id))
                .insert_header(bearer(member_token())),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], item.id.to_string());
    assert_eq!(body["coverUrl"], "/api/v1/media/books/covers/cover.png");
    assert!(body["documentUrl"].is_null());
    assert_eq!(body["hasAccess"], false);
    assert_eq!(body["accessReason"], "not-purchased");
}

#[actix_web::test]
async fn replacing_a_cover_swaps_the_stored_file() {
    let world = TestWorld::new();
    world.seed_admin(ADMIN_SUBJECT).await;
    let old = world.seed_blob("books/covers/old.png", b"old").await;
    let item = world.seed_item(|item| item.cover = Some(old.clone())).await;

    let (status, body) = world
        .send(
            TestRequest::put()
                .uri(&format!("/api/v1/books/{}/cover?filename=new.png", item.id))
                .insert_header(bearer(admin_token()))
                .insert_header((header::CONTENT_TYPE, "image/png"))
                .set_payload("new-cover"),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let url = body["coverUrl"].as_str().expect("cover url");
    assert!(url.starts_with("/api/v1/media/books/covers/"), "{url}");
    assert_ne!(url, "/api/v1/media/books/covers/old.png");
    assert!(!world.blobs.exists(&old).await.expect("exists"));
}

#[actix_web::test]
async fn oversized_covers_are_refused() {
    let world = TestWorld::new();
    world.seed_admin(ADMIN_SUBJECT).await;
    let item = world.seed_item(|_| {}).await;

    let (status, body) = world
        .send(
            TestRequest::put()
                .uri(&format!("/api/v1/books/{}/cover?filename=big.png", item.id))
                .insert_header(bearer(admin_token()))
                .set_payload(vec![0_u8; 2 * 1024 * 1024 + 1]),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "file_too_large");
}

#[actix_web::test]
async fn deleting_an_item_removes_its_files() {
    let world = TestWorld::new();
    world.seed_admin(ADMIN_SUBJECT).await;
    let document = world.seed_blob("books/pdfs/notes.pdf", b"%PDF").await;
    let item = world
        .seed_item(|item| item.document = Some(document.clone()))
        .await;

    let (status, body) = world
        .send(
            TestRequest::delete()
                .uri(&format!("/api/v1/books/{}", item.id))
                .insert_header(bearer(admin_token())),
        )
        .await;
    let (again, _) = world
        .send(TestRequest::get().uri(&format!("/api/v1/books/{}", item.id)))
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert!(!world.blobs.exists(&document).await.expect("exists"));
    assert_eq!(again, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn a_refused_replacement_keeps_the_current_document() {
    let world = TestWorld::new();
    world.seed_admin(ADMIN_SUBJECT).await;
    let document = world.seed_blob("books/pdfs/notes.pdf", b"%PDF-1").await;
    let item = world
        .seed_item(|item| item.document = Some(document.clone()))
        .await;
    let long_name = format!("{}.pdf", "n".repeat(300));

    let (status, _) = world
        .send(
            TestRequest::put()
                .uri(&format!("/api/v1/books/{}/document?filename={long_name}", item.id))
                .insert_header(bearer(admin_token()))
                .set_payload("%PDF-2"),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(world.blobs.exists(&document).await.expect("exists"));
    let (_, body) = world
        .send(TestRequest::get().uri(&format!("/api/v1/books/{}", item.id)))
        .await;
    assert_eq!(body["documentUrl"], "/api/v1/media/books/pdfs/notes.pdf");
}

#[actix_web::test]
async fn listing_applies_filters_newest_first() {
    let world = TestWorld::new();
    world
        .seed_item(|item| {
            item.title = "Old Networks".to_owned();
            item.uploaded_at -= chrono::Duration::days(2);
            premium(item);
        })
        .await;
    world
        .seed_item(|item| {
            item.title = "New Networks".to_owned();
            item.featured = true;
            premium(item);
        })
        .await;
    world
        .seed_item(|item| item.title = "Free Compilers".to_owned())
        .await;

    let (status, body) = world
        .send(TestRequest::get().uri("/api/v1/books?isPremium=true&search=NETWORKS"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["books"][0]["title"], "New Networks");
    assert_eq!(body["books"][1]["title"], "Old Networks");

    let (_, featured) = world
        .send(TestRequest::get().uri("/api/v1/books?featured=true&department="))
        .await;
    assert_eq!(featured["count"], 1);
    assert_eq!(featured["books"][0]["featured"], true);
}

#[actix_web::test]
async fn malformed_listing_filters_are_refused() {
    let world = TestWorld::new();

    let (status, _) = world
        .send(TestRequest::get().uri("/api/v1/books?isPremium=maybe"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
