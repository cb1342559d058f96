//! Command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Variables holding the database URL, in order of preference.
const DATABASE_URL_VARS: [&str; 3] = [
    "DATABASE_URL",
    "STOREFRONT_DATABASE_URL",
    "ADMIN_DATABASE_URL",
];

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] freshmart_db::RepositoryError),

    #[error("{0}")]
    Auth(#[from] freshmart_admin::services::auth::AdminAuthError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Seed file has {} problem(s):\n  {}", .0.len(), .0.join("\n  "))]
    InvalidSeed(Vec<String>),
}

fn database_url() -> Result<SecretString, CliError> {
    DATABASE_URL_VARS
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .map(SecretString::from)
        .ok_or(CliError::MissingEnvVar("DATABASE_URL"))
}

/// Load `.env` and connect.
async fn connect() -> Result<PgPool, CliError> {
    let _ = dotenvy::dotenv();
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(freshmart_db::create_pool(&url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_seed_lists_every_problem() {
        let err = CliError::InvalidSeed(vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(err.to_string(), "Seed file has 2 problem(s):\n  a\n  b");
    }
}
