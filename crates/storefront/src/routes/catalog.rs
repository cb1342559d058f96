//! Public catalog routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use freshmart_core::{Page, PageRequest};
use freshmart_db::models::Category;
use freshmart_db::products::{ProductFilter, ProductSort};
use freshmart_db::{ProductRepository, WishlistRepository};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{ProductDetail, ProductSummary};
use crate::state::AppState;

/// Number of products on the featured shelf.
const FEATURED_LIMIT: u32 = 12;

/// Matches the category cache lifetime.
const CATALOG_CACHE_CONTROL: &str = "public, max-age=60";

/// `GET /api/products` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductQuery {
    fn filter(&self) -> Result<ProductFilter> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_price must not exceed max_price".to_owned(),
            ));
        }
        Ok(ProductFilter {
            category_slug: self.category.clone(),
            q: self.q.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            on_sale: self.on_sale,
            in_stock: self.in_stock,
            sort: self.sort,
            ..ProductFilter::default()
        })
    }

    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

/// GET /api/categories
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = state.catalog().categories(state.pool()).await?;
    Ok((
        [(header::CACHE_CONTROL, CATALOG_CACHE_CONTROL)],
        Json(categories.as_ref().clone()),
    ))
}

/// GET /api/categories/{slug}
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    state
        .catalog()
        .category(state.pool(), &slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))
}

/// GET /api/products
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<ProductSummary>>> {
    let page = ProductRepository::new(state.pool())
        .search(&query.filter()?, query.page())
        .await?;
    let pricing = state.pricing();
    Ok(Json(page.map(|p| ProductSummary::new(&p, pricing))))
}

/// GET /api/products/featured
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<ProductSummary>>> {
    let products = ProductRepository::new(state.pool())
        .featured(FEATURED_LIMIT)
        .await?;
    let pricing = state.pricing();
    Ok(Json(
        products
            .iter()
            .map(|p| ProductSummary::new(p, pricing))
            .collect(),
    ))
}

/// GET /api/products/{slug}
#[instrument(skip(state, user))]
pub async fn product(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let in_wishlist = match user {
        Some(user) => Some(
            WishlistRepository::new(state.pool())
                .contains(user.id, product.id)
                .await?,
        ),
        None => None,
    };

    Ok(Json(ProductDetail::new(&product, state.pricing(), in_wishlist)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(query: &str) -> ProductQuery {
        let uri: axum::http::Uri = format!("/api/products?{query}").parse().unwrap();
        Query::<ProductQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_query_defaults() {
        let query = parse("");
        let filter = query.filter().unwrap();
        assert_eq!(filter.sort, ProductSort::Newest);
        assert!(!filter.on_sale);
        assert!(!filter.include_inactive);
        assert_eq!(query.page(), PageRequest::default());
    }

    #[test]
    fn test_query_parses_filters() {
        let query =
            parse("category=fruit&q=apple&min_price=1.50&on_sale=true&sort=price_desc&page=2");
        let filter = query.filter().unwrap();
        assert_eq!(filter.category_slug.as_deref(), Some("fruit"));
        assert_eq!(filter.min_price, Some(Decimal::new(150, 2)));
        assert!(filter.on_sale);
        assert_eq!(filter.sort, ProductSort::PriceDesc);
        assert_eq!(query.page().page, 2);
    }

    #[test]
    fn test_inverted_price_range_is_rejected() {
        let query = parse("min_price=10&max_price=5");
        assert!(matches!(query.filter(), Err(AppError::BadRequest(_))));
    }
}
