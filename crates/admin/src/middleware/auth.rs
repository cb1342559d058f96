//! Authentication extractor for admin routes.
//!
//! The session only says who signed in. Every request re-reads the account
//! so a demoted or deactivated admin loses access immediately.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use freshmart_db::UserRepository;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Message returned when no admin is signed in.
pub const AUTH_REQUIRED: &str = "Authentication required";

/// Extractor that requires a signed-in, still-active admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppError::Unauthorized(AUTH_REQUIRED.to_owned());

        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(unauthorized)?;

        let user = UserRepository::new(state.pool()).get_by_id(admin.id).await?;
        match user {
            Some(user) if user.is_admin() && user.is_active => Ok(Self(CurrentAdmin::from(&user))),
            _ => {
                tracing::warn!(user_id = %admin.id, "Admin session revoked");
                session.flush().await?;
                Err(unauthorized())
            }
        }
    }
}

/// Store the signed-in admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}
