//! Session middleware configuration for the back office.
//!
//! Stricter than the storefront: `SameSite=Strict` and a 24 hour expiry.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "fm_admin_session";

/// Table in the `tower_sessions` schema holding admin sessions.
pub const SESSION_TABLE_NAME: &str = "admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
