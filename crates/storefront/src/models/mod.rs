//! API representations for the storefront.
//!
//! Domain types live in `freshmart_db::models`; these are the shapes the SPA
//! receives, with prices expressed as [`freshmart_core::Money`].

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{OrderDetail, OrderItemView, OrderSummary};
pub use product::{CategoryRef, ProductDetail, ProductSummary};
pub use session::{CurrentUser, keys as session_keys};
pub use user::UserProfile;
