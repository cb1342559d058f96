//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Liveness
//! GET  /health/ready                     - Readiness (database)
//!
//! # Auth (strict rate limit)
//! POST /api/auth/register                - Create account and sign in
//! POST /api/auth/login                   - Sign in
//! POST /api/auth/logout                  - Sign out
//! GET  /api/auth/me                      - Current profile
//! PUT  /api/auth/me                      - Update name and phone
//! PUT  /api/auth/me/password             - Change password
//!
//! # Catalog
//! GET  /api/categories                   - All categories
//! GET  /api/categories/{slug}            - One category
//! GET  /api/products                     - Search and filter
//! GET  /api/products/featured            - Featured products
//! GET  /api/products/{slug}              - Product detail
//!
//! # Cart (guests and shoppers)
//! GET    /api/cart                       - Current cart
//! DELETE /api/cart                       - Clear
//! GET    /api/cart/count                 - Total quantity
//! POST   /api/cart/items                 - Add
//! PUT    /api/cart/items/{product_id}    - Set quantity
//! DELETE /api/cart/items/{product_id}    - Remove
//! POST   /api/cart/merge                 - Merge local-storage lines
//!
//! # Wishlist (requires auth)
//! GET    /api/wishlist                   - Saved products
//! GET    /api/wishlist/ids               - Saved product ids
//! GET    /api/wishlist/{product_id}      - Membership
//! POST   /api/wishlist/{product_id}      - Add
//! DELETE /api/wishlist/{product_id}      - Remove
//! POST   /api/wishlist/{product_id}/toggle
//! POST   /api/wishlist/{product_id}/move-to-cart
//!
//! # Addresses (requires auth)
//! GET    /api/addresses                  - List
//! POST   /api/addresses                  - Create
//! PUT    /api/addresses/{id}             - Update
//! DELETE /api/addresses/{id}             - Delete
//! POST   /api/addresses/{id}/default     - Make default
//!
//! # Checkout (requires auth)
//! GET  /api/checkout                     - Step, draft, cart and address
//! PUT  /api/checkout/address             - Choose address
//! PUT  /api/checkout/payment             - Choose payment method
//! PUT  /api/checkout/notes               - Delivery notes
//! POST /api/checkout/place               - Place the order
//!
//! # Orders (requires auth)
//! GET  /api/orders                       - Order history
//! GET  /api/orders/{id}                  - Order detail
//! POST /api/orders/{id}/cancel           - Cancel
//! POST /api/orders/{id}/reorder          - Add items back to the cart
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post, put},
};
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_me))
        .route("/me/password", put(auth::change_password))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route("/categories/{slug}", get(catalog::category))
        .route("/products", get(catalog::products))
        .route("/products/featured", get(catalog::featured))
        .route("/products/{slug}", get(catalog::product))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::update).delete(cart::remove),
        )
        .route("/merge", post(cart::merge))
}

fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/ids", get(wishlist::ids))
        .route(
            "/{product_id}",
            get(wishlist::status)
                .post(wishlist::add)
                .delete(wishlist::remove),
        )
        .route("/{product_id}/toggle", post(wishlist::toggle))
        .route("/{product_id}/move-to-cart", post(wishlist::move_to_cart))
}

fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route("/{id}", put(addresses::update).delete(addresses::delete))
        .route("/{id}/default", post(addresses::set_default))
}

fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/address", put(checkout::set_address))
        .route("/payment", put(checkout::set_payment))
        .route("/notes", put(checkout::set_notes))
        .route("/place", post(checkout::place))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/reorder", post(orders::reorder))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/addresses", address_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .layer(api_rate_limiter());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/api", api)
}
