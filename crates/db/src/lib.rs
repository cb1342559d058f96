//! Freshmart database layer.
//!
//! The storefront API, the back-office API and the CLI share one `PostgreSQL`
//! database. This crate owns its schema (see `migrations/`), the domain
//! models loaded from it, and one repository per aggregate.
//!
//! # Schema: `shop`
//!
//! - `user` - Shopper and admin accounts
//! - `category`, `product` - Catalog
//! - `cart_item` - Carts of signed-in shoppers
//! - `wishlist_item` - Saved products
//! - `address` - Delivery addresses, at most one default per user
//! - `order`, `order_item` - Placed orders with address and price snapshots
//!
//! Session data lives in the `tower_sessions` schema.
//!
//! # Migrations
//!
//! ```bash
//! fm-cli migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod addresses;
pub mod carts;
pub mod categories;
pub mod models;
pub mod orders;
pub mod products;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use orders::{NewOrder, OrderRepository, PlaceOrderError, StatusChangeError};
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Convert a non-negative database integer into `u32`.
pub(crate) fn non_negative(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Convert a `COUNT(*)` or similar aggregate into `u64`.
pub(crate) fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(5, "stock").unwrap(), 5);
        assert!(matches!(
            non_negative(-1, "stock"),
            Err(RepositoryError::DataCorruption(msg)) if msg == "negative stock: -1"
        ));
    }

    #[test]
    fn test_count_clamps_negative() {
        assert_eq!(count(42), 42);
        assert_eq!(count(-3), 0);
    }

    #[test]
    fn test_unique_passes_through_other_errors() {
        let err = RepositoryError::unique(sqlx::Error::RowNotFound, "email already exists");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }
}
