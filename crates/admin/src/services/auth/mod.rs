//! Admin authentication service.
//!
//! Admins are rows of `shop.user` with `role = admin`. They sign in with the
//! same Argon2id password as any account; customers and deactivated admins
//! are refused with the same message as a wrong password.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use freshmart_core::{Email, UserRole};
use freshmart_db::models::User;
use freshmart_db::{RepositoryError, UserRepository};

/// Minimum admin password length.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Sign in an active admin.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for unknown emails, wrong
    /// passwords, non-admin accounts and deactivated accounts alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;
        let (user, hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        // Verify first so every refusal costs the same
        verify_password(password, &hash)?;
        if !user.is_admin() || !user.is_active {
            tracing::warn!(
                user_id = %user.id,
                "Admin login refused for non-admin or inactive account"
            );
            return Err(AdminAuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Create a new admin account.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AdminAuthError::WeakPassword` if the password is too short.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, AdminAuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let hash = hash_password(password)?;

        self.users
            .create(&email, name.trim(), &hash, UserRole::Admin)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::UserAlreadyExists,
                other => AdminAuthError::Repository(other),
            })
    }

    /// Change the role of an existing account by email.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::UserNotFound` if no account has this email.
    pub async fn set_role(&self, email: &str, role: UserRole) -> Result<User, AdminAuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AdminAuthError::UserNotFound)?;
        Ok(self.users.set_role(user.id, role).await?)
    }
}

/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` if shorter than [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AdminAuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse battery", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AdminAuthError::PasswordHash)
        ));
    }

    #[test]
    fn test_admin_passwords_are_longer() {
        assert!(validate_password("short-pass").is_err());
        assert!(validate_password("twelve chars").is_ok());
    }
}
