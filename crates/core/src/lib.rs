//! Freshmart Core - Shared domain types and rules.
//!
//! This crate provides the types and business rules used across all Freshmart
//! components:
//! - `storefront` - Public REST API consumed by the shopping SPA
//! - `admin` - Back-office REST API (products, categories, orders, users)
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The `postgres` feature adds sqlx encode/decode
//! implementations so the types can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, slugs and statuses
//! - [`pricing`] - Discount and order total calculations
//! - [`cart`] - Cart lines, guest carts and guest/server cart merging
//! - [`checkout`] - Checkout step sequencing and order numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod pricing;
pub mod types;

pub use types::*;
