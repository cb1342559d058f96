//! Cross-crate checks that need no database: cart merging feeding pricing,
//! checkout sequencing, and both routers' public surfaces.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use freshmart_core::cart::{CartLine, GuestCart, MAX_LINE_QUANTITY, merge_lines};
use freshmart_core::checkout::{CheckoutDraft, CheckoutStep};
use freshmart_core::pricing::{DiscountPercent, PricedLine, PricingPolicy};
use freshmart_core::{AddressId, PaymentMethod, ProductId};
use freshmart_integration_tests::{admin, storefront};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

struct Shelf {
    price: Decimal,
    discount: i32,
    stock: u32,
}

fn shelf() -> HashMap<ProductId, Shelf> {
    HashMap::from([
        (ProductId::new(1), Shelf { price: dec("12.00"), discount: 25, stock: 3 }),
        (ProductId::new(2), Shelf { price: dec("1.50"), discount: 0, stock: 500 }),
        (ProductId::new(3), Shelf { price: dec("8.00"), discount: 10, stock: 0 }),
    ])
}

fn price(lines: &[CartLine], shelf: &HashMap<ProductId, Shelf>) -> Vec<PricedLine> {
    lines
        .iter()
        .map(|line| {
            let product = &shelf[&line.product_id];
            PricedLine {
                unit_price: product.price,
                discount: DiscountPercent::new(product.discount).unwrap(),
                quantity: line.quantity,
            }
        })
        .collect()
}

#[test]
fn test_guest_cart_merged_then_priced() {
    let shelf = shelf();
    let server = [CartLine::new(ProductId::new(1), 2)];

    let mut guest = GuestCart::new();
    guest.add(ProductId::new(1), 2);
    guest.add(ProductId::new(3), 1);
    guest.add(ProductId::new(2), 150);

    let merged = merge_lines(&server, guest.lines(), |id| shelf.get(&id).map(|p| p.stock));
    assert_eq!(
        merged,
        vec![
            CartLine::new(ProductId::new(1), 3),
            CartLine::new(ProductId::new(2), MAX_LINE_QUANTITY),
        ]
    );

    let policy = PricingPolicy::default();
    let totals = policy.totals(&price(&merged, &shelf));
    assert_eq!(totals.item_count, 3 + MAX_LINE_QUANTITY);
    assert_eq!(totals.subtotal.amount(), dec("184.50"));
    assert_eq!(totals.discount_total.amount(), dec("9.00"));
    assert_eq!(totals.delivery_fee.amount(), Decimal::ZERO);
    assert_eq!(totals.total.amount(), dec("175.50"));
    assert!(policy.meets_minimum(&totals));
    assert_eq!(policy.amount_to_free_delivery(&totals).amount(), Decimal::ZERO);
}

#[test]
fn test_small_cart_pays_delivery_and_misses_minimum() {
    let shelf = shelf();
    let lines = [CartLine::new(ProductId::new(2), 4)];
    let policy = PricingPolicy::default();
    let totals = policy.totals(&price(&lines, &shelf));

    assert_eq!(totals.delivery_fee.amount(), dec("4.99"));
    assert_eq!(totals.total.amount(), dec("10.99"));
    assert!(!policy.meets_minimum(&totals));
    assert_eq!(policy.amount_to_free_delivery(&totals).amount(), dec("44.00"));
}

#[test]
fn test_checkout_walks_back_when_cart_empties() {
    let mut draft = CheckoutDraft {
        address_id: Some(AddressId::new(4)),
        payment_method: Some(PaymentMethod::Card),
        notes: None,
    };
    assert_eq!(draft.current_step(false), CheckoutStep::Review);

    let mut guest = GuestCart::from_lines(vec![CartLine::new(ProductId::new(2), 1)]);
    guest.set(ProductId::new(2), 0);
    assert_eq!(draft.current_step(guest.is_empty()), CheckoutStep::Cart);

    draft.payment_method = None;
    assert_eq!(draft.current_step(false), CheckoutStep::Payment);
}

fn lazy_pool() -> sqlx::PgPool {
    // Never connected: only routes that stop before the database are hit
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/freshmart_test")
        .unwrap()
}

#[tokio::test]
async fn test_both_services_answer_health() {
    for app in [storefront(lazy_pool()), admin(lazy_pool())] {
        let request = Request::builder()
            .uri("/health")
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn test_sessions_are_not_shared_between_services() {
    let mut shop = freshmart_integration_tests::TestClient::new(storefront(lazy_pool()));
    let (status, _) = shop.get("/api/cart/count").await;
    assert_eq!(status, StatusCode::OK);

    let mut back_office = freshmart_integration_tests::TestClient::new(admin(lazy_pool()));
    let (status, body) = back_office.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
}
