//! Checkout routes (signed-in shoppers only).

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use freshmart_core::{AddressId, PaymentMethod};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, OrderDetail};
use crate::services::checkout::{CheckoutService, CheckoutView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub address_id: AddressId,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: String,
}

fn checkout<'a>(
    state: &'a AppState,
    session: &'a Session,
    user: &CurrentUser,
) -> CheckoutService<'a> {
    CheckoutService::new(state.pool(), state.pricing(), session, user.id)
}

/// GET /api/checkout
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutView>> {
    Ok(Json(checkout(&state, &session, &user).view().await?))
}

/// PUT /api/checkout/address
#[instrument(skip(state, session, user))]
pub async fn set_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddressRequest>,
) -> Result<Json<CheckoutView>> {
    Ok(Json(
        checkout(&state, &session, &user)
            .set_address(req.address_id)
            .await?,
    ))
}

/// PUT /api/checkout/payment
#[instrument(skip(state, session, user))]
pub async fn set_payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<CheckoutView>> {
    Ok(Json(
        checkout(&state, &session, &user)
            .set_payment(req.payment_method)
            .await?,
    ))
}

/// PUT /api/checkout/notes
#[instrument(skip_all)]
pub async fn set_notes(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(req): Json<NotesRequest>,
) -> Result<Json<CheckoutView>> {
    Ok(Json(
        checkout(&state, &session, &user)
            .set_notes(&req.notes)
            .await?,
    ))
}

/// POST /api/checkout/place
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let order = checkout(&state, &session, &user).place().await?;
    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_number", order.summary.order_number.clone())],
    );
    Ok((StatusCode::CREATED, Json(order)))
}
