//! Wishlist repository.

use sqlx::PgPool;

use freshmart_core::{ProductId, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_SELECT, ProductRow};
use crate::models::Product;

/// Repository for saved products.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved products, most recently saved first. Inactive products are included
    /// so the shopper can see what is no longer sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn products(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT}
             JOIN shop.wishlist_item w ON w.product_id = p.id
             WHERE w.user_id = $1
             ORDER BY w.created_at DESC, p.id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_ids(&self, user_id: UserId) -> Result<Vec<ProductId>, RepositoryError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT product_id FROM shop.wishlist_item
             WHERE user_id = $1 ORDER BY created_at DESC, product_id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(ProductId::new).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM shop.wishlist_item WHERE user_id = $1 AND product_id = $2
             )",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Save a product. Saving twice is a no-op.
    ///
    /// Returns `true` if the product was newly saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO shop.wishlist_item (user_id, product_id) VALUES ($1, $2)
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if the product was saved before.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.wishlist_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
