//! Account routes: registration, sign-in and profile.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, UserProfile};
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Rotate the session id, store the user and fold in the guest cart.
async fn sign_in(state: &AppState, session: &Session, user: &CurrentUser) -> Result<()> {
    session.cycle_id().await?;
    set_current_user(session, user).await?;

    CartService::new(state.pool(), state.pricing(), session, Some(user.id))
        .absorb_guest_cart(user.id)
        .await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// POST /api/auth/register
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    let user = AuthService::new(state.pool())
        .register(&req.email, &req.password, &req.name)
        .await?;

    sign_in(&state, &session, &CurrentUser::from(&user)).await?;
    add_breadcrumb("auth", "Registered", &[("user_id", user.id.to_string())]);
    tracing::info!(user_id = %user.id, "Customer registered");

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// POST /api/auth/login
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserProfile>> {
    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;

    sign_in(&state, &session, &CurrentUser::from(&user)).await?;
    add_breadcrumb("auth", "Signed in", &[("user_id", user.id.to_string())]);

    Ok(Json(UserProfile::from(&user)))
}

/// POST /api/auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserProfile>> {
    let user = AuthService::new(state.pool()).get_user(user.id).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// PUT /api/auth/me
#[instrument(skip(state, session, current, req), fields(user_id = %current.id))]
pub async fn update_me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    let user = AuthService::new(state.pool())
        .update_profile(current.id, &req.name, req.phone.as_deref())
        .await?;

    // Keep the session copy of the display name current
    set_current_user(&session, &CurrentUser::from(&user)).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// PUT /api/auth/me/password
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;
    tracing::info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}
