//! HTTP tests for the `/barcodes` endpoints.
//!
//! Validation and request-shape failures answer before any database work, so
//! they run against an unreachable pool. Full flows are `#[ignore]`d and need
//! `DATABASE_URL`.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json};
use serde_json::json;
use sqlx::PgPool;
use stockroom_core::types::new_id;

#[tokio::test]
async fn validate_reports_checksum_result() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/barcodes/validate",
        json!({"barcode": "4006381333931", "format": "EAN_13"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["valid"], true);
    assert_eq!(json["data"]["format"], "EAN_13");

    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/barcodes/validate",
        json!({"barcode": "4006381333930", "format": "EAN_13"}),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["valid"], false);
    assert_eq!(json["data"]["barcode"], "4006381333930");
}

#[tokio::test]
async fn validate_rejects_unknown_format() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/barcodes/validate",
        json!({"barcode": "123", "format": "QR"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn assign_rejects_unknown_target_type() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/barcodes/assign",
        json!({
            "barcode": "4006381333931",
            "format": "EAN_13",
            "target_id": new_id(),
            "target_type": "SHELF",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_TARGET");
}

#[tokio::test]
async fn targets_rejects_unknown_target_type() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = get(app, &format!("/api/v1/barcodes/targets/shelf/{}", new_id())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Database-backed flows
// ---------------------------------------------------------------------------

async fn seed_product(pool: &PgPool) -> String {
    let app = common::build_test_app(pool.clone());
    let category = body_json(
        post_json(app, "/api/v1/categories", json!({"name": "Groceries"})).await,
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/products",
        json!({
            "category_id": category["data"]["id"],
            "name": "Sparkling Water",
            "sku": "WATER-1",
            "price": "1.25",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = body_json(response).await;
    product["data"]["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn assign_then_scan(pool: PgPool) {
    let product_id = seed_product(&pool).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/barcodes/assign",
        json!({
            "barcode": "4006381333931",
            "format": "EAN_13",
            "target_id": product_id,
            "target_type": "product",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/barcodes/scan", json!({"barcode": "4006381333931"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["found"], true);
    assert_eq!(json["data"]["type"], "PRODUCT");
    assert_eq!(json["data"]["product_id"], product_id.as_str());

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/barcodes/assign",
        json!({
            "barcode": "4006381333931",
            "format": "EAN_13",
            "target_id": product_id,
            "target_type": "PRODUCT",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn scan_unknown_code_is_404_with_body(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/barcodes/lookup/0000000000000").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["data"]["found"], false);
    assert_eq!(json["data"]["barcode"], "0000000000000");
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn assign_with_bad_checksum_is_400(pool: PgPool) {
    let product_id = seed_product(&pool).await;
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/barcodes/assign",
        json!({
            "barcode": "4006381333930",
            "format": "EAN_13",
            "target_id": product_id,
            "target_type": "PRODUCT",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_CHECKSUM");
}
