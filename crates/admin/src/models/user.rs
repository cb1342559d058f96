//! Account representations for the back office.

use serde::Serialize;

use freshmart_db::models::User;
use freshmart_db::users::UserOrderStats;

/// An account with its order history figures.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub stats: UserOrderStats,
}
