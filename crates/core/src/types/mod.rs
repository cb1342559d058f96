//! Core types for Freshmart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod page;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use page::{Page, PageRequest};
pub use price::{CurrencyCode, Money};
pub use slug::{Slug, SlugError};
pub use status::*;
