//! Domain types loaded from the database.
//!
//! These are validated values, separate from the row types the repositories
//! decode into.

pub mod address;
pub mod catalog;
pub mod order;
pub mod user;

pub use address::{Address, AddressInput};
pub use catalog::{Category, CategoryInput, Product, ProductInput};
pub use order::{DeliveryAddress, Order, OrderItem};
pub use user::User;
