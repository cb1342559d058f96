//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL of the back-office API
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_ALLOWED_ORIGINS` - Comma-separated admin SPA origins allowed by CORS
//! - `ADMIN_LOW_STOCK_THRESHOLD` - Stock level counted as low on the dashboard (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `pretty` (default) or `json`

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the back-office API
    pub base_url: String,
    /// Origins of the admin SPA allowed to call the API with credentials
    pub allowed_origins: Vec<String>,
    /// Products with less stock than this count as low stock
    pub low_stock_threshold: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("ADMIN_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("ADMIN_PORT", "3001")?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;
        let allowed_origins = std::env::var("ADMIN_ALLOWED_ORIGINS")
            .map(|raw| parse_origins("ADMIN_ALLOWED_ORIGINS", &raw))
            .unwrap_or_else(|_| Ok(Vec::new()))?;
        let low_stock_threshold = parse_env_or_default::<u32>("ADMIN_LOW_STOCK_THRESHOLD", "10")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            allowed_origins,
            low_stock_threshold,
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            sentry_environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
            log_format: parse_env_or_default::<LogFormat>("LOG_FORMAT", "pretty")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn parse_origins(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Url::parse(s)
                .ok()
                .filter(|url| url.host_str().is_some())
                .map(|url| url.origin().ascii_serialization())
                .ok_or_else(|| {
                    ConfigError::InvalidEnvVar(key.to_string(), format!("bad origin: {s}"))
                })
        })
        .collect()
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Database URL, falling back to the generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins("TEST", "https://admin.freshmart.test/ ,").unwrap();
        assert_eq!(origins, vec!["https://admin.freshmart.test".to_string()]);
        assert!(parse_origins("TEST", "admin.freshmart.test").is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://admin:s3cret-pw@db/shop"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "https://admin.freshmart.test".to_string(),
            allowed_origins: Vec::new(),
            low_stock_threshold: 10,
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Json,
        };
        assert!(config.is_secure());
        assert_eq!(config.socket_addr().port(), 3001);
        assert!(!format!("{config:?}").contains("s3cret-pw"));
    }
}
