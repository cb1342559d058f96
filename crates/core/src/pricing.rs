//! Discount and order total calculations.
//!
//! Every product carries a list price and an optional percentage discount.
//! Totals are computed line by line (each line rounded to cents) and then
//! summed, so the figures shown per line always add up to the order total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::price::round_cents;
use crate::types::{CurrencyCode, Money};

/// Errors that can occur when constructing a [`DiscountPercent`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    /// Discount is outside the allowed range.
    #[error("discount must be between 0 and {max} percent (got {got})")]
    OutOfRange {
        /// Maximum allowed discount.
        max: i32,
        /// Rejected value.
        got: i32,
    },
}

/// A product discount in whole percent, `0..=90`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    /// Largest discount the store allows.
    pub const MAX: i32 = 90;

    pub const NONE: Self = Self(0);

    /// # Errors
    ///
    /// Returns `DiscountError::OutOfRange` for values outside `0..=90`.
    pub fn new(percent: i32) -> Result<Self, DiscountError> {
        if !(0..=Self::MAX).contains(&percent) {
            return Err(DiscountError::OutOfRange {
                max: Self::MAX,
                got: percent,
            });
        }
        // Range check above guarantees the value fits.
        Ok(Self(u8::try_from(percent).unwrap_or(0)))
    }

    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i32> for DiscountPercent {
    type Error = DiscountError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercent> for i32 {
    fn from(value: DiscountPercent) -> Self {
        Self::from(value.0)
    }
}

/// Unit price after applying a percentage discount, rounded to cents.
#[must_use]
pub fn discounted_unit_price(price: Decimal, discount: DiscountPercent) -> Decimal {
    if discount.is_zero() {
        return round_cents(price);
    }
    let hundred = Decimal::ONE_HUNDRED;
    round_cents(price * (hundred - Decimal::from(discount.get())) / hundred)
}

/// A priced quantity of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    /// List price per unit.
    pub unit_price: Decimal,
    pub discount: DiscountPercent,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub fn unit_net_price(&self) -> Decimal {
        discounted_unit_price(self.unit_price, self.discount)
    }

    /// Quantity times list price.
    #[must_use]
    pub fn list_total(&self) -> Decimal {
        round_cents(self.unit_price * Decimal::from(self.quantity))
    }

    /// Quantity times discounted price.
    #[must_use]
    pub fn net_total(&self) -> Decimal {
        round_cents(self.unit_net_price() * Decimal::from(self.quantity))
    }

    /// What the discount saves on this line.
    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.list_total() - self.net_total()
    }
}

/// Totals for a cart or an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub item_count: u32,
    pub subtotal: Money,
    pub discount_total: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Subtotal after discounts, before delivery.
    #[must_use]
    pub fn net_subtotal(&self) -> Money {
        self.subtotal - self.discount_total
    }
}

/// Store-wide pricing rules, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub currency: CurrencyCode,
    /// Flat delivery fee charged below the free-delivery threshold.
    pub delivery_fee: Decimal,
    /// Net subtotal at or above which delivery is free.
    pub free_delivery_threshold: Decimal,
    /// Smallest net subtotal that can be checked out.
    pub minimum_order: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::USD,
            delivery_fee: Decimal::new(499, 2),
            free_delivery_threshold: Decimal::new(5000, 2),
            minimum_order: Decimal::new(1000, 2),
        }
    }
}

impl PricingPolicy {
    #[must_use]
    pub fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.currency)
    }

    /// Compute totals for a set of lines.
    #[must_use]
    pub fn totals(&self, lines: &[PricedLine]) -> OrderTotals {
        let item_count = lines.iter().map(|l| l.quantity).sum();
        let subtotal: Decimal = lines.iter().map(PricedLine::list_total).sum();
        let discount_total: Decimal = lines.iter().map(PricedLine::savings).sum();
        let net = subtotal - discount_total;

        let delivery_fee = if item_count == 0 || net >= self.free_delivery_threshold {
            Decimal::ZERO
        } else {
            self.delivery_fee
        };

        OrderTotals {
            item_count,
            subtotal: self.money(subtotal),
            discount_total: self.money(discount_total),
            delivery_fee: self.money(delivery_fee),
            total: self.money(net + delivery_fee),
        }
    }

    /// Remaining spend until delivery becomes free; zero once reached.
    #[must_use]
    pub fn amount_to_free_delivery(&self, totals: &OrderTotals) -> Money {
        self.money(self.free_delivery_threshold)
            .saturating_sub(totals.net_subtotal())
    }

    /// Whether the net subtotal reaches the minimum order value.
    #[must_use]
    pub fn meets_minimum(&self, totals: &OrderTotals) -> bool {
        totals.net_subtotal().amount() >= self.minimum_order
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(price: &str, discount: i32, quantity: u32) -> PricedLine {
        PricedLine {
            unit_price: dec(price),
            discount: DiscountPercent::new(discount).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_discount_range() {
        assert!(DiscountPercent::new(0).is_ok());
        assert!(DiscountPercent::new(90).is_ok());
        assert!(DiscountPercent::new(91).is_err());
        assert!(DiscountPercent::new(-1).is_err());
        assert!(serde_json::from_str::<DiscountPercent>("95").is_err());
        assert_eq!(
            serde_json::from_str::<DiscountPercent>("15").unwrap().get(),
            15
        );
    }

    #[test]
    fn test_discounted_unit_price() {
        let pct = |p| DiscountPercent::new(p).unwrap();
        assert_eq!(discounted_unit_price(dec("3.99"), pct(0)), dec("3.99"));
        assert_eq!(discounted_unit_price(dec("10.00"), pct(25)), dec("7.50"));
        // 2.99 * 0.85 = 2.5415
        assert_eq!(discounted_unit_price(dec("2.99"), pct(15)), dec("2.54"));
        // 1.25 * 0.9 = 1.125 rounds away from zero
        assert_eq!(discounted_unit_price(dec("1.25"), pct(10)), dec("1.13"));
    }

    #[test]
    fn test_line_totals() {
        let l = line("2.99", 15, 3);
        assert_eq!(l.list_total(), dec("8.97"));
        assert_eq!(l.net_total(), dec("7.62"));
        assert_eq!(l.savings(), dec("1.35"));
    }

    #[test]
    fn test_totals_below_free_delivery() {
        let policy = PricingPolicy::default();
        let totals = policy.totals(&[line("2.99", 15, 3), line("4.50", 0, 2)]);

        assert_eq!(totals.item_count, 5);
        assert_eq!(totals.subtotal.amount(), dec("17.97"));
        assert_eq!(totals.discount_total.amount(), dec("1.35"));
        assert_eq!(totals.delivery_fee.amount(), dec("4.99"));
        assert_eq!(totals.total.amount(), dec("21.61"));
        assert_eq!(
            policy.amount_to_free_delivery(&totals).amount(),
            dec("33.38")
        );
        assert!(policy.meets_minimum(&totals));
    }

    #[test]
    fn test_free_delivery_uses_discounted_subtotal() {
        let policy = PricingPolicy::default();

        // List 52.00, net 46.80: still pays delivery
        let totals = policy.totals(&[line("52.00", 10, 1)]);
        assert_eq!(totals.delivery_fee.amount(), dec("4.99"));

        // Exactly at the threshold is free
        let totals = policy.totals(&[line("25.00", 0, 2)]);
        assert!(totals.delivery_fee.is_zero());
        assert_eq!(totals.total.amount(), dec("50.00"));
        assert!(policy.amount_to_free_delivery(&totals).is_zero());
    }

    #[test]
    fn test_empty_cart_totals() {
        let policy = PricingPolicy::default();
        let totals = policy.totals(&[]);
        assert_eq!(totals.item_count, 0);
        assert!(totals.delivery_fee.is_zero());
        assert!(totals.total.is_zero());
        assert!(!policy.meets_minimum(&totals));
    }

    #[test]
    fn test_minimum_order() {
        let policy = PricingPolicy::default();
        assert!(!policy.meets_minimum(&policy.totals(&[line("9.99", 0, 1)])));
        assert!(policy.meets_minimum(&policy.totals(&[line("10.00", 0, 1)])));
    }
}
