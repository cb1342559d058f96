//! Checkout step sequencing.
//!
//! The SPA walks the shopper through cart review, delivery address, payment
//! method and a final review. The server keeps the choices made so far in a
//! [`CheckoutDraft`] and derives the current step from it, so a reload (or a
//! second tab) always resumes at the first step that still needs input.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::types::{AddressId, PaymentMethod};

/// Maximum length of delivery notes.
pub const MAX_NOTES_LENGTH: usize = 500;

/// Characters used in order numbers (no 0/O or 1/I).
const ORDER_NUMBER_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of the random suffix of an order number.
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Reasons an order cannot be placed yet.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,
    #[error("choose a delivery address")]
    MissingAddress,
    #[error("choose a payment method")]
    MissingPaymentMethod,
}

impl CheckoutError {
    /// The step the shopper has to go back to.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        match self {
            Self::EmptyCart => CheckoutStep::Cart,
            Self::MissingAddress => CheckoutStep::Address,
            Self::MissingPaymentMethod => CheckoutStep::Payment,
        }
    }
}

/// Checkout steps in the order the shopper visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Cart,
    Address,
    Payment,
    Review,
}

impl CheckoutStep {
    pub const ALL: [Self; 4] = [Self::Cart, Self::Address, Self::Payment, Self::Review];

    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Cart => Some(Self::Address),
            Self::Address => Some(Self::Payment),
            Self::Payment => Some(Self::Review),
            Self::Review => None,
        }
    }

    #[must_use]
    pub const fn previous(&self) -> Option<Self> {
        match self {
            Self::Cart => None,
            Self::Address => Some(Self::Cart),
            Self::Payment => Some(Self::Address),
            Self::Review => Some(Self::Payment),
        }
    }

    /// 1-based position, for "step 2 of 4" displays.
    #[must_use]
    pub const fn ordinal(&self) -> u8 {
        match self {
            Self::Cart => 1,
            Self::Address => 2,
            Self::Payment => 3,
            Self::Review => 4,
        }
    }
}

/// Choices made during checkout, kept in the session until the order is placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub address_id: Option<AddressId>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl CheckoutDraft {
    /// First step whose prerequisite is not yet met.
    #[must_use]
    pub fn current_step(&self, cart_is_empty: bool) -> CheckoutStep {
        match self.ensure_ready(cart_is_empty) {
            Ok(()) => CheckoutStep::Review,
            Err(e) => e.step(),
        }
    }

    /// Check that every step has been completed.
    ///
    /// # Errors
    ///
    /// Returns the first missing prerequisite, in step order.
    pub const fn ensure_ready(&self, cart_is_empty: bool) -> Result<(), CheckoutError> {
        if cart_is_empty {
            return Err(CheckoutError::EmptyCart);
        }
        if self.address_id.is_none() {
            return Err(CheckoutError::MissingAddress);
        }
        if self.payment_method.is_none() {
            return Err(CheckoutError::MissingPaymentMethod);
        }
        Ok(())
    }

    /// Set delivery notes, trimming whitespace and enforcing the length limit.
    ///
    /// Blank notes clear the field.
    pub fn set_notes(&mut self, notes: &str) {
        let trimmed = notes.trim();
        self.notes = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.chars().take(MAX_NOTES_LENGTH).collect())
        };
    }
}

/// Generate a human-friendly order number such as `FM-261019-7KQ2XD`.
pub fn order_number<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .filter_map(|_| ORDER_NUMBER_ALPHABET.choose(&mut *rng).map(|&b| char::from(b)))
        .collect();
    format!("FM-{}-{suffix}", now.format("%y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_step_navigation() {
        assert_eq!(CheckoutStep::Cart.next(), Some(CheckoutStep::Address));
        assert_eq!(CheckoutStep::Review.next(), None);
        assert_eq!(CheckoutStep::Cart.previous(), None);
        assert_eq!(CheckoutStep::Review.previous(), Some(CheckoutStep::Payment));

        for pair in CheckoutStep::ALL.windows(2) {
            if let [a, b] = pair {
                assert_eq!(a.next(), Some(*b));
                assert_eq!(b.previous(), Some(*a));
                assert_eq!(a.ordinal() + 1, b.ordinal());
            }
        }
    }

    #[test]
    fn test_current_step_follows_missing_prerequisites() {
        let mut draft = CheckoutDraft::default();
        assert_eq!(draft.current_step(true), CheckoutStep::Cart);
        assert_eq!(draft.current_step(false), CheckoutStep::Address);

        draft.address_id = Some(AddressId::new(1));
        assert_eq!(draft.current_step(false), CheckoutStep::Payment);

        draft.payment_method = Some(PaymentMethod::Card);
        assert_eq!(draft.current_step(false), CheckoutStep::Review);

        // Emptying the cart sends the shopper back to the start
        assert_eq!(draft.current_step(true), CheckoutStep::Cart);
    }

    #[test]
    fn test_ensure_ready_reports_first_gap() {
        let draft = CheckoutDraft {
            address_id: None,
            payment_method: Some(PaymentMethod::CashOnDelivery),
            notes: None,
        };
        assert_eq!(draft.ensure_ready(false), Err(CheckoutError::MissingAddress));
        assert_eq!(draft.ensure_ready(true), Err(CheckoutError::EmptyCart));
    }

    #[test]
    fn test_set_notes() {
        let mut draft = CheckoutDraft::default();
        draft.set_notes("  leave at the door  ");
        assert_eq!(draft.notes.as_deref(), Some("leave at the door"));

        draft.set_notes("   ");
        assert_eq!(draft.notes, None);

        draft.set_notes(&"x".repeat(800));
        assert_eq!(draft.notes.unwrap().len(), MAX_NOTES_LENGTH);
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let number = order_number(now, &mut rand::rng());

        assert!(number.starts_with("FM-261019-"));
        let suffix = number.trim_start_matches("FM-261019-");
        assert_eq!(suffix.len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| ORDER_NUMBER_ALPHABET.contains(&b)));
    }
}
