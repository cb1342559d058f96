//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and credential changes (Argon2id)
//! - `catalog` - Cached category reads
//! - `cart` - Guest (session) and signed-in (database) carts
//! - `checkout` - Checkout draft and order placement

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
