//! Product management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use freshmart_core::{CategoryId, Page, PageRequest, ProductId, Slug};
use freshmart_db::categories::resolve_slug;
use freshmart_db::models::ProductInput;
use freshmart_db::products::{ProductFilter, ProductSort};
use freshmart_db::{CategoryRepository, ProductRepository};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::AdminProduct;
use crate::state::AppState;

/// Listing filter on `is_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveFilter {
    Active,
    Inactive,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ActiveFilter>,
    /// Only products below the low-stock threshold.
    #[serde(default)]
    pub low_stock: bool,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductListQuery {
    fn filter(&self, low_stock_threshold: u32) -> ProductFilter {
        ProductFilter {
            category_id: self.category_id,
            q: self.q.clone(),
            include_inactive: self.status.is_none(),
            inactive_only: self.status == Some(ActiveFilter::Inactive),
            stock_below: self.low_stock.then_some(low_stock_threshold),
            sort: self.sort,
            ..ProductFilter::default()
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
        )
    }
}

/// Body of `PATCH /api/products/{id}/stock`: an absolute level or a delta.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StockUpdate {
    Set { stock: u32 },
    Adjust { adjustment: i32 },
}

#[derive(Debug, Deserialize)]
pub struct ActiveUpdate {
    pub is_active: bool,
}

/// Validate the fields and the category, and settle the slug.
async fn validated(state: &AppState, input: &ProductInput) -> Result<Slug> {
    input.validate().map_err(AppError::BadRequest)?;
    if let Some(category_id) = input.category_id
        && CategoryRepository::new(state.pool())
            .get_by_id(category_id)
            .await?
            .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "category {category_id} does not exist"
        )));
    }
    resolve_slug(input.slug.as_deref(), &input.name).map_err(AppError::BadRequest)
}

/// GET /api/products
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Page<AdminProduct>>> {
    let threshold = state.low_stock_threshold();
    let page = ProductRepository::new(state.pool())
        .search(&query.filter(threshold), query.page())
        .await?;
    Ok(Json(page.map(|p| AdminProduct::new(&p, threshold))))
}

/// POST /api/products
#[instrument(skip_all, fields(admin_id = %admin.id, name = %input.name))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<AdminProduct>)> {
    let slug = validated(&state, &input).await?;
    let product = ProductRepository::new(state.pool())
        .create(&input, &slug)
        .await?;
    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok((
        StatusCode::CREATED,
        Json(AdminProduct::new(&product, state.low_stock_threshold())),
    ))
}

/// GET /api/products/{id}
#[instrument(skip(state, _admin))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<AdminProduct>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;
    Ok(Json(AdminProduct::new(&product, state.low_stock_threshold())))
}

/// PUT /api/products/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<AdminProduct>> {
    let slug = validated(&state, &input).await?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input, &slug)
        .await?;
    Ok(Json(AdminProduct::new(&product, state.low_stock_threshold())))
}

/// DELETE /api/products/{id}
///
/// Carts and wishlists drop the product; past orders keep their snapshot.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/products/{id}/stock
///
/// An adjustment that would take stock below zero is refused with 409.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_stock(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(update): Json<StockUpdate>,
) -> Result<Json<AdminProduct>> {
    let products = ProductRepository::new(state.pool());
    let product = match update {
        StockUpdate::Set { stock } => products.set_stock(id, stock).await?,
        StockUpdate::Adjust { adjustment } => products.adjust_stock(id, adjustment).await?,
    };
    tracing::info!(product_id = %id, stock = product.stock, "Stock updated");
    Ok(Json(AdminProduct::new(&product, state.low_stock_threshold())))
}

/// PATCH /api/products/{id}/active
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_active(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(update): Json<ActiveUpdate>,
) -> Result<Json<AdminProduct>> {
    let product = ProductRepository::new(state.pool())
        .set_active(id, update.is_active)
        .await?;
    Ok(Json(AdminProduct::new(&product, state.low_stock_threshold())))
}
