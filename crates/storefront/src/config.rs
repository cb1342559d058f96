//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of this API
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ALLOWED_ORIGINS` - Comma-separated SPA origins allowed by CORS
//! - `FM_CURRENCY` - ISO 4217 currency code (default: USD)
//! - `FM_DELIVERY_FEE` - Flat delivery fee (default: 4.99)
//! - `FM_FREE_DELIVERY_THRESHOLD` - Net subtotal for free delivery (default: 50.00)
//! - `FM_MINIMUM_ORDER` - Minimum net subtotal to check out (default: 10.00)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `pretty` (default) or `json`

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use freshmart_core::CurrencyCode;
use freshmart_core::pricing::PricingPolicy;
use rust_decimal::Decimal;
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
    /// Human-readable output for local development.
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers.
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Origins of the shopping SPA allowed to call the API with credentials
    pub allowed_origins: Vec<String>,
    /// Store-wide pricing rules
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let allowed_origins = parse_origins(
            "STOREFRONT_ALLOWED_ORIGINS",
            &get_env_or_default("STOREFRONT_ALLOWED_ORIGINS", ""),
        )?;

        let pricing = pricing_from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let log_format = parse_env_or_default::<LogFormat>("LOG_FORMAT", "pretty")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            allowed_origins,
            pricing,
            sentry_dsn,
            sentry_environment,
            log_format,
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

/// Load the pricing policy from `FM_*` variables.
fn pricing_from_env() -> Result<PricingPolicy, ConfigError> {
    let pricing = PricingPolicy {
        currency: parse_env_or_default::<CurrencyCode>("FM_CURRENCY", "USD")?,
        delivery_fee: parse_env_or_default::<Decimal>("FM_DELIVERY_FEE", "4.99")?,
        free_delivery_threshold: parse_env_or_default::<Decimal>(
            "FM_FREE_DELIVERY_THRESHOLD",
            "50.00",
        )?,
        minimum_order: parse_env_or_default::<Decimal>("FM_MINIMUM_ORDER", "10.00")?,
    };

    for (key, value) in [
        ("FM_DELIVERY_FEE", pricing.delivery_fee),
        ("FM_FREE_DELIVERY_THRESHOLD", pricing.free_delivery_threshold),
        ("FM_MINIMUM_ORDER", pricing.minimum_order),
    ] {
        if value.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must not be negative".to_string(),
            ));
        }
    }

    Ok(pricing)
}

/// Parse a comma-separated list of origins (`scheme://host[:port]`).
fn parse_origins(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let url = Url::parse(s)
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{s}: {e}")))?;
            if url.host_str().is_none() {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    format!("{s}: origin must have a host"),
                ));
            }
            Ok(url.origin().ascii_serialization())
        })
        .collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., STOREFRONT_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
