//! Session-related types.
//!
//! Types stored in the session for authentication and shopping state.

use serde::{Deserialize, Serialize};

use freshmart_core::{Email, UserId, UserRole};
use freshmart_db::models::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Session keys.
pub mod keys {
    /// The current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Cart of an anonymous shopper (`GuestCart`).
    pub const GUEST_CART: &str = "guest_cart";

    /// Checkout selections made so far (`CheckoutDraft`).
    pub const CHECKOUT: &str = "checkout";
}
