//! Address repository.
//!
//! A user has at most one default address (enforced by a partial unique
//! index). The first address a user saves becomes the default, and deleting
//! the default promotes the most recently updated remaining address.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use freshmart_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, user_id, label, recipient, line1, line2, city, region,
                               postal_code, phone, is_default, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    label: Option<String>,
    recipient: String,
    line1: String,
    line2: Option<String>,
    city: String,
    region: Option<String>,
    postal_code: String,
    phone: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            label: row.label,
            recipient: row.recipient,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            region: row.region,
            postal_code: row.postal_code,
            phone: row.phone,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn clear_default(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.address SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Serialize changes to one user's address book until the transaction ends.
///
/// Locks the owning user row; the address rows alone are not enough while
/// the user has none.
async fn lock_address_book(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM shop.user WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(())
}

/// Repository for delivery addresses. Every method is scoped to one user.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Default address first, then most recently updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address
             WHERE user_id = $1
             ORDER BY is_default DESC, updated_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_default(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE user_id = $1 AND is_default"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_address_book(&mut tx, user_id).await?;

        let has_any: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.address WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        let is_default = input.is_default || !has_any;
        if is_default {
            clear_default(&mut tx, user_id).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO shop.address
                (user_id, label, recipient, line1, line2, city, region, postal_code,
                 phone, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(input.label.as_deref())
        .bind(&input.recipient)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(input.region.as_deref())
        .bind(&input.postal_code)
        .bind(input.phone.as_deref())
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Replace an address. Unsetting `is_default` on the default address is
    /// ignored; pick another default instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_address_book(&mut tx, user_id).await?;

        let was_default: Option<bool> = sqlx::query_scalar(
            "SELECT is_default FROM shop.address WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let was_default = was_default.ok_or(RepositoryError::NotFound)?;

        let is_default = was_default || input.is_default;
        if is_default && !was_default {
            clear_default(&mut tx, user_id).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE shop.address
             SET label = $3, recipient = $4, line1 = $5, line2 = $6, city = $7,
                 region = $8, postal_code = $9, phone = $10, is_default = $11
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(input.label.as_deref())
        .bind(&input.recipient)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(input.region.as_deref())
        .bind(&input.postal_code)
        .bind(input.phone.as_deref())
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the user.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_address_book(&mut tx, user_id).await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.address WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        clear_default(&mut tx, user_id).await?;
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE shop.address SET is_default = TRUE WHERE id = $1
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete an address, promoting another one if it was the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the user.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_address_book(&mut tx, user_id).await?;

        let was_default: Option<bool> = sqlx::query_scalar(
            "DELETE FROM shop.address WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        match was_default {
            None => return Err(RepositoryError::NotFound),
            Some(true) => {
                sqlx::query(
                    "UPDATE shop.address SET is_default = TRUE
                     WHERE id = (SELECT id FROM shop.address WHERE user_id = $1
                                 ORDER BY updated_at DESC, id DESC LIMIT 1)",
                )
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
            Some(false) => {}
        }

        tx.commit().await?;
        Ok(())
    }
}
