//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use freshmart_core::{Email, UserId, UserRole};

/// A shopper or back-office account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    /// Deactivated accounts cannot sign in.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
