//! Product repository: catalog search, lookups and back-office writes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use freshmart_core::pricing::DiscountPercent;
use freshmart_core::{CategoryId, Page, PageRequest, ProductId, ProductUnit, Slug};

use super::users::escape_like;
use super::{RepositoryError, count, non_negative};
use crate::models::{Product, ProductInput};

pub(crate) const PRODUCT_SELECT: &str = "
    SELECT p.id, p.category_id, c.name AS category_name, c.slug AS category_slug,
           p.name, p.slug, p.description, p.image_url, p.unit, p.price,
           p.discount_percent, p.stock, p.is_active, p.is_featured,
           p.created_at, p.updated_at
    FROM shop.product p
    LEFT JOIN shop.category c ON c.id = p.category_id";

const PRODUCT_COUNT: &str = "
    SELECT COUNT(*)
    FROM shop.product p
    LEFT JOIN shop.category c ON c.id = p.category_id";

/// Discounted price, matching `discounted_unit_price` in `freshmart-core`.
const SALE_PRICE_SQL: &str = "ROUND(p.price * (100 - p.discount_percent) / 100.0, 2)";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i32,
    category_id: Option<i32>,
    category_name: Option<String>,
    category_slug: Option<String>,
    name: String,
    slug: String,
    description: Option<String>,
    image_url: Option<String>,
    unit: ProductUnit,
    price: Decimal,
    discount_percent: i32,
    stock: i32,
    is_active: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product slug in database: {e}"))
        })?;
        let discount = DiscountPercent::new(row.discount_percent)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: ProductId::new(row.id),
            category_id: row.category_id.map(CategoryId::new),
            category_name: row.category_name,
            category_slug: row.category_slug,
            name: row.name,
            slug,
            description: row.description,
            image_url: row.image_url,
            unit: row.unit,
            price: row.price,
            discount,
            stock: non_negative(row.stock, "stock")?,
            is_active: row.is_active,
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Sort orders for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
    /// Largest discount first.
    Discount,
}

impl ProductSort {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            Self::PriceAsc => {
                " ORDER BY ROUND(p.price * (100 - p.discount_percent) / 100.0, 2) ASC, p.id"
            }
            Self::PriceDesc => {
                " ORDER BY ROUND(p.price * (100 - p.discount_percent) / 100.0, 2) DESC, p.id"
            }
            Self::Name => " ORDER BY p.name ASC, p.id",
            Self::Discount => " ORDER BY p.discount_percent DESC, p.created_at DESC, p.id",
        }
    }
}

/// Filters for product listings.
///
/// Price bounds apply to the discounted price.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_slug: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Matches name or description, case-insensitively.
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub on_sale: bool,
    pub in_stock: bool,
    pub featured: bool,
    /// Back office only: also list inactive products.
    pub include_inactive: bool,
    /// Back office only: list inactive products and nothing else.
    pub inactive_only: bool,
    /// Back office only: products with less stock than this.
    pub stock_below: Option<u32>,
    pub sort: ProductSort,
}

fn push_product_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    query.push(" WHERE TRUE");
    if filter.inactive_only {
        query.push(" AND NOT p.is_active");
    } else if !filter.include_inactive {
        query.push(" AND p.is_active");
    }
    if let Some(slug) = filter.category_slug.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND c.slug = ").push_bind(slug.to_owned());
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = filter.min_price {
        query
            .push(format!(" AND {SALE_PRICE_SQL} >= "))
            .push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query
            .push(format!(" AND {SALE_PRICE_SQL} <= "))
            .push_bind(max);
    }
    if filter.on_sale {
        query.push(" AND p.discount_percent > 0");
    }
    if filter.in_stock {
        query.push(" AND p.stock > 0");
    }
    if filter.featured {
        query.push(" AND p.is_featured");
    }
    if let Some(limit) = filter.stock_below {
        query
            .push(" AND p.stock < ")
            .push_bind(i32::try_from(limit).unwrap_or(i32::MAX));
    }
}

fn stock_param(stock: u32) -> Result<i32, RepositoryError> {
    i32::try_from(stock).map_err(|_| RepositoryError::Conflict("stock is too large".to_owned()))
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn search(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut count_query = QueryBuilder::new(PRODUCT_COUNT);
        push_product_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::new(PRODUCT_SELECT);
        push_product_filter(&mut query, filter);
        query
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(self.pool).await?;
        let products = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Product>, _>>()?;

        Ok(Page::new(products, page, count(total)))
    }

    /// Active, in-stock featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let filter = ProductFilter {
            featured: true,
            in_stock: true,
            ..ProductFilter::default()
        };
        let page = self.search(&filter, PageRequest::new(1, limit)).await?;
        Ok(page.items)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Load several products at once, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        input: &ProductInput,
        slug: &Slug,
    ) -> Result<Product, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.product
                (category_id, name, slug, description, image_url, unit, price,
                 discount_percent, stock, is_active, is_featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING id",
        )
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.unit)
        .bind(input.price)
        .bind(i32::from(input.discount_percent))
        .bind(stock_param(input.stock)?)
        .bind(input.is_active)
        .bind(input.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "product slug already exists"))?;

        self.get_by_id(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace every editable field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        slug: &Slug,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.product
             SET category_id = $2, name = $3, slug = $4, description = $5, image_url = $6,
                 unit = $7, price = $8, discount_percent = $9, stock = $10,
                 is_active = $11, is_featured = $12
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.unit)
        .bind(input.price)
        .bind(i32::from(input.discount_percent))
        .bind(stock_param(input.stock)?)
        .bind(input.is_active)
        .bind(input.is_featured)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "product slug already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Past order lines keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product, RepositoryError> {
        let result = sqlx::query("UPDATE shop.product SET stock = $2 WHERE id = $1")
            .bind(id)
            .bind(stock_param(stock)?)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Add (or with a negative delta, remove) stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if stock would go negative.
    pub async fn adjust_stock(
        &self,
        id: ProductId,
        delta: i32,
    ) -> Result<Product, RepositoryError> {
        let updated = sqlx::query_scalar::<_, i32>(
            "UPDATE shop.product SET stock = stock + $2
             WHERE id = $1 AND stock + $2 >= 0
             RETURNING id",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(self.pool)
        .await?;

        if updated.is_none() {
            return match self.get_by_id(id).await? {
                Some(p) => Err(RepositoryError::Conflict(format!(
                    "only {} in stock for {}",
                    p.stock, p.name
                ))),
                None => Err(RepositoryError::NotFound),
            };
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query("UPDATE shop.product SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Insert or update by slug, for seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        input: &ProductInput,
        slug: &Slug,
    ) -> Result<ProductId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.product
                (category_id, name, slug, description, image_url, unit, price,
                 discount_percent, stock, is_active, is_featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (slug) DO UPDATE
             SET category_id = EXCLUDED.category_id, name = EXCLUDED.name,
                 description = EXCLUDED.description, image_url = EXCLUDED.image_url,
                 unit = EXCLUDED.unit, price = EXCLUDED.price,
                 discount_percent = EXCLUDED.discount_percent, stock = EXCLUDED.stock,
                 is_active = EXCLUDED.is_active, is_featured = EXCLUDED.is_featured
             RETURNING id",
        )
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(slug.as_str())
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.unit)
        .bind(input.price)
        .bind(i32::from(input.discount_percent))
        .bind(stock_param(input.stock)?)
        .bind(input.is_active)
        .bind(input.is_featured)
        .fetch_one(self.pool)
        .await?;

        Ok(ProductId::new(id))
    }

    /// Active products with stock strictly below `threshold`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_low_stock(&self, threshold: u32) -> Result<u64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.product WHERE is_active AND stock < $1",
        )
        .bind(i32::try_from(threshold).unwrap_or(i32::MAX))
        .fetch_one(self.pool)
        .await?;
        Ok(count(total))
    }

    /// Returns `(total, active)` product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<(u64, u64), RepositoryError> {
        let (total, active): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM shop.product",
        )
        .fetch_one(self.pool)
        .await?;
        Ok((count(total), count(active)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(filter: &ProductFilter) -> String {
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM shop.product p");
        push_product_filter(&mut query, filter);
        query.sql().to_owned()
    }

    #[test]
    fn test_default_filter_lists_active_only() {
        assert_eq!(
            sql(&ProductFilter::default()),
            "SELECT 1 FROM shop.product p WHERE TRUE AND p.is_active"
        );
    }

    #[test]
    fn test_admin_filter_includes_inactive() {
        let filter = ProductFilter {
            include_inactive: true,
            stock_below: Some(10),
            ..ProductFilter::default()
        };
        assert_eq!(
            sql(&filter),
            "SELECT 1 FROM shop.product p WHERE TRUE AND p.stock < $1"
        );
    }

    #[test]
    fn test_inactive_only() {
        let filter = ProductFilter {
            inactive_only: true,
            ..ProductFilter::default()
        };
        assert_eq!(
            sql(&filter),
            "SELECT 1 FROM shop.product p WHERE TRUE AND NOT p.is_active"
        );
    }

    #[test]
    fn test_all_filters_bind_in_order() {
        let filter = ProductFilter {
            category_slug: Some("fruit".to_owned()),
            q: Some("apple".to_owned()),
            min_price: Some(Decimal::ONE),
            max_price: Some(Decimal::TEN),
            on_sale: true,
            in_stock: true,
            ..ProductFilter::default()
        };
        let sql = sql(&filter);
        assert!(sql.contains("c.slug = $1"));
        assert!(sql.contains("p.name ILIKE $2 OR p.description ILIKE $3"));
        assert!(sql.contains(&format!("{SALE_PRICE_SQL} >= $4")));
        assert!(sql.contains(&format!("{SALE_PRICE_SQL} <= $5")));
        assert!(sql.ends_with("AND p.discount_percent > 0 AND p.stock > 0"));
    }

    #[test]
    fn test_sort_uses_sale_price() {
        assert!(ProductSort::PriceAsc.order_by().contains(SALE_PRICE_SQL));
        assert!(ProductSort::PriceDesc.order_by().contains(SALE_PRICE_SQL));
        assert_eq!(ProductSort::default(), ProductSort::Newest);
    }
}
