//! Cart repository for signed-in shoppers.
//!
//! Guests keep their cart in the session; once signed in, lines live in
//! `shop.cart_item` keyed by `(user_id, product_id)`.

use sqlx::PgPool;

use freshmart_core::cart::{CartLine, MAX_LINE_QUANTITY};
use freshmart_core::{ProductId, UserId};

use super::{RepositoryError, non_negative};

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    product_id: i32,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self::new(
            ProductId::new(row.product_id),
            non_negative(row.quantity, "cart quantity")?,
        ))
    }
}

fn quantity_param(quantity: u32) -> i32 {
    // Capped well inside i32.
    i32::try_from(quantity.min(MAX_LINE_QUANTITY)).unwrap_or(1)
}

/// Repository for server-side carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Lines in the order they were first added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT product_id, quantity FROM shop.cart_item
             WHERE user_id = $1
             ORDER BY position, added_at, product_id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_of(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<u32, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM shop.cart_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        quantity.map_or(Ok(0), |q| non_negative(q, "cart quantity"))
    }

    /// Add to any existing quantity, capped at `cap`.
    ///
    /// Returns the resulting quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        cap: u32,
    ) -> Result<u32, RepositoryError> {
        let cap = quantity_param(cap.max(1));
        let quantity: i32 = sqlx::query_scalar(
            "INSERT INTO shop.cart_item (user_id, product_id, quantity, position)
             VALUES ($1, $2, LEAST($3, $4),
                     COALESCE((SELECT MAX(position) + 1 FROM shop.cart_item WHERE user_id = $1), 0))
             ON CONFLICT (user_id, product_id) DO UPDATE
             SET quantity = LEAST(shop.cart_item.quantity + EXCLUDED.quantity, $4)
             RETURNING quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_param(quantity))
        .bind(cap)
        .fetch_one(self.pool)
        .await?;

        non_negative(quantity, "cart quantity")
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        if quantity == 0 {
            self.remove(user_id, product_id).await?;
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO shop.cart_item (user_id, product_id, quantity, position)
             VALUES ($1, $2, $3,
                     COALESCE((SELECT MAX(position) + 1 FROM shop.cart_item WHERE user_id = $1), 0))
             ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_param(quantity))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if a line was removed.
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
            sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Replace the whole cart in one transaction, keeping `lines` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn replace(
        &self,
        user_id: UserId,
        lines: &[CartLine],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (position, line) in (0_i32..).zip(lines.iter().filter(|l| l.quantity > 0)) {
            sqlx::query(
                "INSERT INTO shop.cart_item (user_id, product_id, quantity, position)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(line.product_id)
            .bind(quantity_param(line.quantity))
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Total number of units in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM shop.cart_item WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(u32::try_from(total).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_param_caps() {
        assert_eq!(quantity_param(3), 3);
        assert_eq!(quantity_param(u32::MAX), 99);
    }
}
