//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use freshmart_core::{Email, UserId};
use freshmart_db::models::User;

/// Session-stored admin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    pub name: String,
}

impl From<&User> for CurrentAdmin {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// The current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
