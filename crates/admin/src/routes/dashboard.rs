//! Dashboard figures.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use freshmart_db::models::Order;
use freshmart_db::orders::OrderStats;
use freshmart_db::{CategoryRepository, OrderRepository, ProductRepository, UserRepository};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Number of orders listed under "recent orders".
const RECENT_ORDERS: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogCounts {
    pub products: u64,
    pub active_products: u64,
    /// Active products below the low-stock threshold.
    pub low_stock_products: u64,
    pub low_stock_threshold: u32,
    pub categories: u64,
    pub customers: u64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub counts: CatalogCounts,
    pub orders: OrderStats,
    pub recent_orders: Vec<Order>,
}

/// GET /api/dashboard
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>> {
    let pool = state.pool();
    let threshold = state.low_stock_threshold();
    let products = ProductRepository::new(pool);
    let orders = OrderRepository::new(pool);
    let category_repo = CategoryRepository::new(pool);
    let users = UserRepository::new(pool);

    let ((total, active), low_stock, categories, customers, stats, recent) = tokio::try_join!(
        products.counts(),
        products.count_low_stock(threshold),
        category_repo.list(),
        users.count_customers(),
        orders.stats(),
        orders.recent(RECENT_ORDERS),
    )?;

    Ok(Json(Dashboard {
        counts: CatalogCounts {
            products: total,
            active_products: active,
            low_stock_products: low_stock,
            low_stock_threshold: threshold,
            categories: u64::try_from(categories.len()).unwrap_or(u64::MAX),
            customers,
        },
        orders: stats,
        recent_orders: recent,
    }))
}
