//! Admin account management.
//!
//! ```bash
//! FM_ADMIN_PASSWORD='a long passphrase' fm-cli admin create -e ops@example.com -n "Ops"
//! fm-cli admin promote -e someone@example.com
//! fm-cli admin demote -e someone@example.com
//! ```
//!
//! The password is read from `FM_ADMIN_PASSWORD` so it never appears in shell
//! history or the process list.

use secrecy::{ExposeSecret, SecretString};

use freshmart_admin::services::auth::{AdminAuthService, validate_password};
use freshmart_core::UserRole;

use super::{CliError, connect};

/// Environment variable holding the new admin's password.
pub const PASSWORD_VAR: &str = "FM_ADMIN_PASSWORD";

fn password_from_env() -> Result<SecretString, CliError> {
    let _ = dotenvy::dotenv();
    std::env::var(PASSWORD_VAR)
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar(PASSWORD_VAR))
}

/// Create an admin account.
///
/// # Errors
///
/// Returns an error if the password is missing or weak, or the email is taken.
pub async fn create(email: &str, name: &str) -> Result<(), CliError> {
    let password = password_from_env()?;
    // Fail before touching the database
    validate_password(password.expose_secret())?;

    let pool = connect().await?;
    let user = AdminAuthService::new(&pool)
        .create_admin(email, name, password.expose_secret())
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin created");
    Ok(())
}

/// Change the role of an existing account.
///
/// # Errors
///
/// Returns an error if no account has this email.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), CliError> {
    let pool = connect().await?;
    let user = AdminAuthService::new(&pool).set_role(email, role).await?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "Role updated");
    Ok(())
}
