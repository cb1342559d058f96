//! End-to-end tests for the back office API.
//!
//! These tests require a running `PostgreSQL` server reachable through
//! `DATABASE_URL`; each test runs against its own freshly migrated database.
//!
//! Run with: cargo test -p freshmart-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;

use freshmart_integration_tests::{
    ADMIN_PASSWORD, TestClient, add_address, admin, seed_product, signed_in_admin,
    signed_in_shopper, stock_of, storefront,
};

// ============================================================================
// Sign in
// ============================================================================

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_only_admins_can_sign_in(pool: PgPool) {
    // A shopper account with a valid password is still refused
    signed_in_shopper(&pool, "shopper@example.com").await;
    let mut client = TestClient::new(admin(pool.clone()));
    let (status, body) = client
        .post(
            "/api/auth/login",
            json!({"email": "shopper@example.com", "password": "correct horse"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let mut admin_client = signed_in_admin(&pool, "ops@example.com").await;
    let (status, me) = admin_client.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ops@example.com");

    let (status, _) = client
        .post(
            "/api/auth/login",
            json!({"email": "ops@example.com", "password": "wrong passphrase"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_demoted_admin_loses_access_immediately(pool: PgPool) {
    let mut owner = signed_in_admin(&pool, "owner@example.com").await;
    let mut helper = signed_in_admin(&pool, "helper@example.com").await;

    let (status, _) = helper.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);

    let (_, me) = helper.get("/api/auth/me").await;
    let helper_id = me["id"].as_i64().unwrap();
    let (status, user) = owner
        .patch(&format!("/api/users/{helper_id}/role"), json!({"role": "customer"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "customer");

    let (status, _) = helper.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_cannot_lock_themselves_out(pool: PgPool) {
    let mut client = signed_in_admin(&pool, "solo@example.com").await;
    let (_, me) = client.get("/api/auth/me").await;
    let id = me["id"].as_i64().unwrap();

    let (status, _) = client
        .patch(&format!("/api/users/{id}/role"), json!({"role": "customer"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = client
        .patch(&format!("/api/users/{id}/active"), json!({"is_active": false}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = client.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Catalog
// ============================================================================

async fn create_category(client: &mut TestClient, name: &str) -> Value {
    let (status, category) = client.post("/api/categories", json!({"name": name})).await;
    assert_eq!(status, StatusCode::CREATED, "{category}");
    category
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_product_management(pool: PgPool) {
    let mut client = signed_in_admin(&pool, "catalog@example.com").await;
    let fruit = create_category(&mut client, "Fresh Fruit").await;
    assert_eq!(fruit["slug"], "fresh-fruit");

    let (status, product) = client
        .post(
            "/api/products",
            json!({
                "category_id": fruit["id"],
                "name": "Blood Oranges",
                "price": "5.00",
                "discount_percent": 20,
                "stock": 3
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    assert_eq!(product["slug"], "blood-oranges");
    let sale_price: Decimal = product["sale_price"].as_str().unwrap().parse().unwrap();
    assert_eq!(sale_price, Decimal::new(400, 2));
    assert_eq!(product["low_stock"], true);
    let id = product["id"].as_i64().unwrap();

    let (_, low) = client.get("/api/products?low_stock=true").await;
    assert_eq!(low["total"], 1);

    // Stock equal to the threshold is no longer low
    let (status, product) = client
        .patch(&format!("/api/products/{id}/stock"), json!({"adjustment": 7}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["stock"], 10);
    assert_eq!(product["low_stock"], false);
    let (_, low) = client.get("/api/products?low_stock=true").await;
    assert_eq!(low["total"], 0);
    let (_, dashboard) = client.get("/api/dashboard").await;
    assert_eq!(dashboard["counts"]["low_stock_products"], 0);

    let (status, _) = client
        .patch(&format!("/api/products/{id}/stock"), json!({"adjustment": -20}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Hidden from the storefront once deactivated
    let mut shop = TestClient::new(storefront(pool.clone()));
    let (status, _) = shop.get("/api/products/blood-oranges").await;
    assert_eq!(status, StatusCode::OK);

    client
        .patch(&format!("/api/products/{id}/active"), json!({"is_active": false}))
        .await;
    let (status, _) = shop.get("/api/products/blood-oranges").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, inactive) = client.get("/api/products?status=inactive").await;
    assert_eq!(inactive["total"], 1);
    let (_, active) = client.get("/api/products?status=active").await;
    assert_eq!(active["total"], 0);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_catalog_validation(pool: PgPool) {
    let mut client = signed_in_admin(&pool, "rules@example.com").await;
    let dairy = create_category(&mut client, "Dairy").await;

    let (status, _) = client.post("/api/categories", json!({"name": "Dairy"})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = client
        .post(
            "/api/products",
            json!({"category_id": 999_999, "name": "Ghost Milk", "price": "1.00"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post(
            "/api/products",
            json!({"category_id": dairy["id"], "name": "Skimmed Milk", "price": "0.00"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting a category leaves its products uncategorised
    let (_, product) = client
        .post(
            "/api/products",
            json!({"category_id": dairy["id"], "name": "Butter", "price": "3.20"}),
        )
        .await;
    let dairy_id = dairy["id"].as_i64().unwrap();
    let (status, _) = client.delete(&format!("/api/categories/{dairy_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let product_id = product["id"].as_i64().unwrap();
    let (_, product) = client.get(&format!("/api/products/{product_id}")).await;
    assert_eq!(product["category_id"], Value::Null);
}

// ============================================================================
// Orders
// ============================================================================

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_order_lifecycle(pool: PgPool) {
    let melon = seed_product(&pool, "Honeydew Melon", "4.00", 0, 10).await;
    let mut shopper = signed_in_shopper(&pool, "buyer@example.com").await;
    add_address(&mut shopper).await;
    shopper
        .post("/api/cart/items", json!({"product_id": melon, "quantity": 3}))
        .await;
    shopper
        .put("/api/checkout/payment", json!({"payment_method": "cash_on_delivery"}))
        .await;
    let (status, placed) = shopper.post("/api/checkout/place", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = placed["id"].as_i64().unwrap();

    let mut client = signed_in_admin(&pool, "orders@example.com").await;
    let (_, pending) = client.get("/api/orders?status=pending").await;
    assert_eq!(pending["total"], 1);

    let (status, order) = client.get(&format!("/api/orders/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["customer"]["email"], "buyer@example.com");
    assert_eq!(order["next_statuses"], json!(["confirmed", "cancelled"]));

    let (status, _) = client
        .patch(&format!("/api/orders/{id}/status"), json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    for next in ["confirmed", "processing", "shipped"] {
        let (status, order) = client
            .patch(&format!("/api/orders/{id}/status"), json!({"status": next}))
            .await;
        assert_eq!(status, StatusCode::OK, "{next}: {order}");
        assert_eq!(order["status"], next);
    }

    // Shipped orders are out of the shopper's hands
    let (status, _) = shopper.post(&format!("/api/orders/{id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, order) = client
        .patch(&format!("/api/orders/{id}/status"), json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["next_statuses"], json!([]));
    assert_eq!(stock_of(&pool, melon).await, 7);

    let (_, dashboard) = client.get("/api/dashboard").await;
    assert_eq!(dashboard["recent_orders"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_admin_cancel_restocks(pool: PgPool) {
    let melon = seed_product(&pool, "Honeydew Melon", "4.00", 0, 10).await;
    let mut shopper = signed_in_shopper(&pool, "fickle@example.com").await;
    add_address(&mut shopper).await;
    shopper
        .post("/api/cart/items", json!({"product_id": melon, "quantity": 4}))
        .await;
    shopper
        .put("/api/checkout/payment", json!({"payment_method": "card"}))
        .await;
    let (_, placed) = shopper.post("/api/checkout/place", json!({})).await;
    let id = placed["id"].as_i64().unwrap();
    assert_eq!(stock_of(&pool, melon).await, 6);

    let mut client = signed_in_admin(&pool, "support@example.com").await;
    let (status, order) = client
        .patch(&format!("/api/orders/{id}/status"), json!({"status": "cancelled"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");
    assert_eq!(stock_of(&pool, melon).await, 10);
}

#[sqlx::test(migrator = "freshmart_db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_protected_routes_need_a_session(pool: PgPool) {
    let mut client = TestClient::new(admin(pool.clone()));
    let (status, _) = client.get("/api/products").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client
        .post(
            "/api/auth/login",
            json!({"email": "nobody@example.com", "password": ADMIN_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
