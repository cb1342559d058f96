//! Authentication extractors.
//!
//! The signed-in shopper is stored in the session as a [`CurrentUser`].
//! Each request re-reads the account, so deactivating a customer ends their
//! session on the next call.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use freshmart_db::UserRepository;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Message returned when no shopper is signed in.
pub const AUTH_REQUIRED: &str = "Authentication required";

/// Extractor that requires a signed-in, active shopper.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(AUTH_REQUIRED.to_owned()))
    }
}

/// Extractor that optionally gets the signed-in shopper.
///
/// Guests get `None`, and so does a session whose account was deactivated.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts, state).await?))
    }
}

/// Session user, refreshed from the database.
///
/// A session pointing at a missing or inactive account is flushed.
async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    let Some(stored) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    match UserRepository::new(state.pool()).get_by_id(stored.id).await? {
        Some(user) if user.is_active => Ok(Some(CurrentUser::from(&user))),
        _ => {
            tracing::warn!(user_id = %stored.id, "Shopper session revoked");
            session.flush().await?;
            Ok(None)
        }
    }
}

/// Store the signed-in shopper in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in shopper from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
