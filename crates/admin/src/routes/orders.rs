//! Order fulfilment.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use freshmart_core::{OrderId, OrderStatus, Page, PageRequest, PaymentStatus};
use freshmart_db::models::Order;
use freshmart_db::orders::OrderFilter;
use freshmart_db::{OrderRepository, UserRepository};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::AdminOrderDetail;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    /// Order number, recipient or customer email.
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderListQuery {
    fn filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status,
            q: self.q.clone(),
            user_id: None,
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
}

async fn detail(state: &AppState, order: Order) -> Result<AdminOrderDetail> {
    let orders = OrderRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let (items, customer) =
        tokio::try_join!(orders.items(order.id), users.get_by_id(order.user_id))?;
    Ok(AdminOrderDetail::new(order, items, customer.as_ref()))
}

/// GET /api/orders
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Page<Order>>> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .list(&query.filter(), query.page())
            .await?,
    ))
}

/// GET /api/orders/{id}
#[instrument(skip(state, _admin))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<AdminOrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;
    Ok(Json(detail(&state, order).await?))
}

/// PATCH /api/orders/{id}/status
///
/// Cancelling restocks the items; delivering a cash-on-delivery order marks
/// it paid.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<AdminOrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, update.status)
        .await?;
    Ok(Json(detail(&state, order).await?))
}

/// PATCH /api/orders/{id}/payment
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_payment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(update): Json<PaymentUpdate>,
) -> Result<Json<AdminOrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .set_payment_status(id, update.payment_status)
        .await?;
    tracing::info!(order_id = %id, payment_status = %order.payment_status, "Payment status set");
    Ok(Json(detail(&state, order).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Uri;

    fn query(uri: &str) -> std::result::Result<OrderListQuery, String> {
        let uri: Uri = uri.parse().unwrap();
        Query::<OrderListQuery>::try_from_uri(&uri)
            .map(|q| q.0)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_order_filters() {
        let q = query("/api/orders?status=shipped&q=FM-2610&page=3").unwrap();
        let filter = q.filter();
        assert_eq!(filter.status, Some(OrderStatus::Shipped));
        assert_eq!(filter.q.as_deref(), Some("FM-2610"));
        assert_eq!(filter.user_id, None);
        assert_eq!(q.page().page, 3);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(query("/api/orders?status=lost").is_err());
    }

    #[test]
    fn test_update_bodies() {
        let update: StatusUpdate = serde_json::from_str(r#"{"status": "delivered"}"#).unwrap();
        assert_eq!(update.status, OrderStatus::Delivered);

        let update: PaymentUpdate =
            serde_json::from_str(r#"{"payment_status": "refunded"}"#).unwrap();
        assert_eq!(update.payment_status, PaymentStatus::Refunded);
    }
}
