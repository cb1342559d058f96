//! Cart routes. Work for guests (session cart) and signed-in shoppers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use freshmart_core::ProductId;
use freshmart_core::cart::CartLine;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::services::cart::{CartService, CartView};
use crate::state::AppState;

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

fn cart<'a>(
    state: &'a AppState,
    session: &'a Session,
    user: Option<&CurrentUser>,
) -> CartService<'a> {
    CartService::new(state.pool(), state.pricing(), session, user.map(|u| u.id))
}

/// GET /api/cart
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartView>> {
    Ok(Json(cart(&state, &session, user.as_ref()).view().await?))
}

/// GET /api/cart/count
#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartCount>> {
    let count = cart(&state, &session, user.as_ref()).count().await?;
    Ok(Json(CartCount { count }))
}

/// POST /api/cart/items
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let view = cart(&state, &session, user.as_ref())
        .add(req.product_id, req.quantity)
        .await?;
    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", req.product_id.to_string()),
            ("quantity", req.quantity.to_string()),
        ],
    );
    Ok(Json(view))
}

/// PUT /api/cart/items/{product_id}
#[instrument(skip(state, session, user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    Ok(Json(
        cart(&state, &session, user.as_ref())
            .set(product_id, req.quantity)
            .await?,
    ))
}

/// DELETE /api/cart/items/{product_id}
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    Ok(Json(
        cart(&state, &session, user.as_ref())
            .remove(product_id)
            .await?,
    ))
}

/// DELETE /api/cart
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartView>> {
    Ok(Json(cart(&state, &session, user.as_ref()).clear().await?))
}

/// POST /api/cart/merge
#[instrument(skip(state, session, user, req), fields(lines = req.lines.len()))]
pub async fn merge(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<MergeRequest>,
) -> Result<Json<CartView>> {
    Ok(Json(
        cart(&state, &session, user.as_ref())
            .merge(&req.lines)
            .await?,
    ))
}
