//! HTTP middleware stack for the back office.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing with status and latency)
//! 3. Request ID
//! 4. CORS (admin SPA origins, credentials allowed)
//! 5. Session layer (`tower_sessions.admin_session`)
//! 6. Security headers
//! 7. Login rate limit (on `/api/auth/login` only)
//!
//! Authentication is per handler via the [`RequireAdmin`] extractor.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, set_current_admin};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
