//! Order history routes (signed-in shoppers only).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tower_sessions::Session;
use tracing::instrument;

use freshmart_core::cart::CartLine;
use freshmart_core::{OrderId, Page, PageRequest};
use freshmart_db::OrderRepository;
use freshmart_db::orders::OrderFilter;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{OrderDetail, OrderSummary};
use crate::services::cart::{CartService, CartView};
use crate::state::AppState;

/// GET /api/orders
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<OrderSummary>>> {
    let filter = OrderFilter {
        user_id: Some(user.id),
        ..OrderFilter::default()
    };
    let orders = OrderRepository::new(state.pool())
        .list(&filter, page.normalized())
        .await?;
    Ok(Json(orders.map(|o| OrderSummary::from(&o))))
}

/// GET /api/orders/{id}
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;
    let items = orders.items(order.id).await?;
    Ok(Json(OrderDetail::new(&order, &items)))
}

/// POST /api/orders/{id}/cancel
#[instrument(skip(state, user))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders.cancel_for_customer(user.id, id).await?;
    let items = orders.items(order.id).await?;
    Ok(Json(OrderDetail::new(&order, &items)))
}

/// POST /api/orders/{id}/reorder
///
/// Adds every item whose product still exists; quantities are clamped to
/// current stock like any other merge.
#[instrument(skip(state, session, user))]
pub async fn reorder(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<CartView>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    let lines: Vec<CartLine> = orders
        .items(order.id)
        .await?
        .iter()
        .filter_map(|item| Some(CartLine::new(item.product_id?, item.quantity)))
        .collect();

    let view = CartService::new(state.pool(), state.pricing(), &session, Some(user.id))
        .merge(&lines)
        .await?;
    tracing::info!(order_id = %id, lines = lines.len(), "Reordered");
    Ok(Json(view))
}
