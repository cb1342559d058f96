//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (database)
//!
//! # Auth
//! POST /api/auth/login                - Sign in (rate limited)
//! POST /api/auth/logout               - Sign out
//! GET  /api/auth/me                   - Current admin
//!
//! # Dashboard
//! GET  /api/dashboard                 - Counts, order stats, recent orders
//!
//! # Categories
//! GET    /api/categories              - List
//! POST   /api/categories              - Create
//! GET    /api/categories/{id}         - Detail
//! PUT    /api/categories/{id}         - Replace
//! DELETE /api/categories/{id}         - Delete (products become uncategorised)
//!
//! # Products
//! GET    /api/products                - Search (q, category_id, status, low_stock)
//! POST   /api/products                - Create
//! GET    /api/products/{id}           - Detail
//! PUT    /api/products/{id}           - Replace
//! DELETE /api/products/{id}           - Delete
//! PATCH  /api/products/{id}/stock     - Set or adjust stock
//! PATCH  /api/products/{id}/active    - Activate or deactivate
//!
//! # Orders
//! GET    /api/orders                  - Search (status, q)
//! GET    /api/orders/{id}             - Detail with items and customer
//! PATCH  /api/orders/{id}/status      - Move through the lifecycle
//! PATCH  /api/orders/{id}/payment     - Set payment status
//!
//! # Users
//! GET    /api/users                   - Search (q, role, is_active)
//! GET    /api/users/{id}              - Detail with order stats
//! PATCH  /api/users/{id}/role         - Promote or demote
//! PATCH  /api/users/{id}/active       - Activate or deactivate
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login).layer(login_rate_limiter()))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/stock", patch(products::update_stock))
        .route("/{id}/active", patch(products::update_active))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/payment", patch(orders::update_payment))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}", get(users::show))
        .route("/{id}/role", patch(users::update_role))
        .route("/{id}/active", patch(users::update_active))
}

/// Create all routes for the back office.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes())
        .route("/api/dashboard", get(dashboard::dashboard))
        .nest("/api/categories", category_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/users", user_routes())
}
