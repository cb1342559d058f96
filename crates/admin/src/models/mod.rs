//! API representations for the back office.

pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use catalog::AdminProduct;
pub use order::{AdminOrderDetail, OrderCustomer};
pub use session::{CurrentAdmin, keys as session_keys};
pub use user::UserDetail;
