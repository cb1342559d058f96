//! Freshmart storefront API.
//!
//! The REST API behind the shopping SPA: catalog, cart, wishlist, addresses,
//! checkout and order history. Exposed as a library so the router can be
//! exercised in tests without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, header},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::state::AppState;

/// CORS for the SPA origins; credentials are allowed so the session cookie flows.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// Build the full router with every middleware except the Sentry layers.
///
/// `store` backs the session layer: `PostgresStore` in production, a
/// `MemoryStore` in tests.
pub fn build_app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(store, state.config().is_secure());
    let cors = cors_layer(&state.config().allowed_origins);

    Router::new()
        .merge(routes::routes())
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use freshmart_core::pricing::PricingPolicy;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::config::{LogFormat, StorefrontConfig};

    fn app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/freshmart_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            allowed_origins: vec!["http://localhost:5173".to_owned()],
            pricing: PricingPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Pretty,
        };
        // Never connected: these tests only hit routes that stop before the database
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/freshmart_test")
            .unwrap();
        build_app(AppState::new(config, pool), MemoryStore::default())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn test_protected_routes_require_sign_in() {
        for uri in ["/api/auth/me", "/api/wishlist", "/api/orders", "/api/checkout"] {
            let response = app().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(json_body(response).await["error"], "Authentication required");
        }
    }

    #[tokio::test]
    async fn test_guest_cart_count_starts_at_zero() {
        let response = app().oneshot(get("/api/cart/count")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "count": 0 }));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/cart/items")
            .header("x-forwarded-for", "203.0.113.9")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"product_id": 1, "quantity": 0}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "quantity must be at least 1");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_spa_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/cart")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }
}
