//! End-to-end shopping flows against the storefront API.
//!
//! These tests require a running `PostgreSQL` server reachable through
//! `DATABASE_URL`; each test runs against its own freshly migrated database.
//!
//! Run with: cargo test -p freshmart-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use freshmart_integration_tests::{
    TestClient, add_address, amount, seed_product, signed_in_shopper, stock_of, storefront,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ============================================================================
// Cart
// ============================================================================

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_guest_cart_is_kept_in_session(pool: PgPool) {
    let apples = seed_product(&pool, "Gala Apples", "3.40", 0, 10).await;
    let mut client = TestClient::new(storefront(pool));

    let (status, cart) = client
        .post("/api/cart/items", json!({"product_id": apples, "quantity": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"][0]["quantity"], 2);

    let (_, count) = client.get("/api/cart/count").await;
    assert_eq!(count["count"], 2);

    client.forget_session();
    let (_, count) = client.get("/api/cart/count").await;
    assert_eq!(count["count"], 0);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_sign_in_merges_guest_cart_clamped_to_stock(pool: PgPool) {
    let apples = seed_product(&pool, "Gala Apples", "3.40", 0, 5).await;
    let milk = seed_product(&pool, "Whole Milk", "1.49", 0, 20).await;

    let mut client = signed_in_shopper(&pool, "merge@example.com").await;
    client
        .post("/api/cart/items", json!({"product_id": apples, "quantity": 2}))
        .await;
    let (status, _) = client.send(axum::http::Method::POST, "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    client.forget_session();

    // Shopping as a guest again
    client
        .post("/api/cart/items", json!({"product_id": apples, "quantity": 4}))
        .await;
    client
        .post("/api/cart/items", json!({"product_id": milk, "quantity": 1}))
        .await;

    let (status, _) = client
        .post(
            "/api/auth/login",
            json!({"email": "merge@example.com", "password": "correct horse"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, cart) = client.get("/api/cart").await;
    let lines = cart["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    // Server line first, summed and capped at the 5 in stock
    assert_eq!(lines[0]["product"]["id"], json!(apples));
    assert_eq!(lines[0]["quantity"], 5);
    assert_eq!(lines[1]["product"]["id"], json!(milk));
    assert_eq!(lines[1]["quantity"], 1);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_merge_endpoint_drops_unknown_products(pool: PgPool) {
    let bread = seed_product(&pool, "Sourdough Loaf", "4.50", 0, 3).await;
    let mut client = signed_in_shopper(&pool, "replay@example.com").await;

    let (status, cart) = client
        .post(
            "/api/cart/merge",
            json!({"lines": [
                {"product_id": bread, "quantity": 7},
                {"product_id": 999_999, "quantity": 1}
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let lines = cart["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 3);
}

// ============================================================================
// Checkout
// ============================================================================

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_places_order_and_takes_stock(pool: PgPool) {
    let apples = seed_product(&pool, "Gala Apples", "12.00", 25, 10).await;
    let milk = seed_product(&pool, "Whole Milk", "1.50", 0, 20).await;
    let mut client = signed_in_shopper(&pool, "checkout@example.com").await;

    let (_, checkout) = client.get("/api/checkout").await;
    assert_eq!(checkout["step"], "cart");

    client
        .post("/api/cart/items", json!({"product_id": apples, "quantity": 2}))
        .await;
    client
        .post("/api/cart/items", json!({"product_id": milk, "quantity": 4}))
        .await;

    let (_, checkout) = client.get("/api/checkout").await;
    assert_eq!(checkout["step"], "address");

    // The default address is picked up without an explicit choice
    let address = add_address(&mut client).await;
    let (_, checkout) = client.get("/api/checkout").await;
    assert_eq!(checkout["step"], "payment");
    assert_eq!(checkout["address"]["id"], address["id"]);

    let (status, checkout) = client
        .put("/api/checkout/payment", json!({"payment_method": "card"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checkout["step"], "review");

    client
        .put("/api/checkout/notes", json!({"notes": "  ring twice  "}))
        .await;

    let (status, order) = client.post("/api/checkout/place", json!({})).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert!(order["order_number"].as_str().unwrap().starts_with("FM-"));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_method"], "card");
    assert_eq!(order["notes"], "ring twice");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    // 2 x 12.00 at 25% off plus 4 x 1.50, below the free delivery threshold
    assert_eq!(amount(&order["subtotal"]), dec("30.00"));
    assert_eq!(amount(&order["discount_total"]), dec("6.00"));
    assert_eq!(amount(&order["delivery_fee"]), dec("4.99"));
    assert_eq!(amount(&order["total"]), dec("28.99"));

    assert_eq!(stock_of(&pool, apples).await, 8);
    assert_eq!(stock_of(&pool, milk).await, 16);

    let (_, count) = client.get("/api/cart/count").await;
    assert_eq!(count["count"], 0);

    let (_, history) = client.get("/api/orders").await;
    assert_eq!(history["items"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_refuses_order_below_minimum(pool: PgPool) {
    let milk = seed_product(&pool, "Whole Milk", "1.50", 0, 20).await;
    let mut client = signed_in_shopper(&pool, "small@example.com").await;
    add_address(&mut client).await;

    client
        .post("/api/cart/items", json!({"product_id": milk, "quantity": 2}))
        .await;
    client
        .put("/api/checkout/payment", json!({"payment_method": "cash_on_delivery"}))
        .await;

    let (status, body) = client.post("/api/checkout/place", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("minimum order"));
    assert_eq!(stock_of(&pool, milk).await, 20);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_cancelling_restocks(pool: PgPool) {
    let cheese = seed_product(&pool, "Aged Cheddar", "6.00", 0, 4).await;
    let mut client = signed_in_shopper(&pool, "cancel@example.com").await;
    add_address(&mut client).await;

    client
        .post("/api/cart/items", json!({"product_id": cheese, "quantity": 3}))
        .await;
    client
        .put("/api/checkout/payment", json!({"payment_method": "cash_on_delivery"}))
        .await;
    let (status, order) = client.post("/api/checkout/place", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["can_cancel"], true);
    assert_eq!(stock_of(&pool, cheese).await, 1);

    let id = order["id"].as_i64().unwrap();
    let (status, order) = client.post(&format!("/api/orders/{id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");
    assert_eq!(stock_of(&pool, cheese).await, 4);

    let (status, _) = client.post(&format!("/api/orders/{id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
