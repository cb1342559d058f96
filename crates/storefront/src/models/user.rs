//! Account profile as returned to the SPA.

use chrono::{DateTime, Utc};
use serde::Serialize;

use freshmart_core::{Email, UserId, UserRole};
use freshmart_db::models::User;

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}
