//! Database migrations.
//!
//! ```bash
//! fm-cli migrate
//! ```
//!
//! Applies the migrations embedded in `freshmart-db` (`crates/db/migrations/`)
//! to the database named by `DATABASE_URL` (or `STOREFRONT_DATABASE_URL`).

use super::{CliError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    freshmart_db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
