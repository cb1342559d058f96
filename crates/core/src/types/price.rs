//! Type-safe money representation using decimal arithmetic.
//!
//! Amounts are always held at two decimal places. Rounding uses
//! midpoint-away-from-zero, which is what shoppers expect to see on a receipt.

use core::fmt;
use core::ops::{Add, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places kept for every amount.
const SCALE: u32 = 2;

/// Round a decimal to cents.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// An amount of money in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    amount: Decimal,
    /// ISO 4217 currency code.
    currency: CurrencyCode,
}

impl Money {
    /// Create a new amount, rounded to cents.
    #[must_use]
    pub fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self {
            amount: round_cents(amount),
            currency,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Create an amount from an integer number of minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::new(cents, SCALE),
            currency,
        }
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency)
    }

    /// Subtract, flooring the result at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        let diff = self.amount - other.amount;
        if diff.is_sign_negative() {
            Self::zero(self.currency)
        } else {
            Self::new(diff, self.currency)
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Self::new(self.amount + rhs.amount, self.currency)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Self::new(self.amount - rhs.amount, self.currency)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd(s: &str) -> Money {
        Money::new(s.parse().unwrap(), CurrencyCode::USD)
    }

    #[test]
    fn test_new_rounds_half_away_from_zero() {
        assert_eq!(usd("1.005").amount(), "1.01".parse::<Decimal>().unwrap());
        assert_eq!(usd("1.004").amount(), "1.00".parse::<Decimal>().unwrap());
        assert_eq!(usd("2.675").amount(), "2.68".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_times() {
        assert_eq!(usd("2.49").times(3), usd("7.47"));
        assert_eq!(usd("2.49").times(0), Money::zero(CurrencyCode::USD));
    }

    #[test]
    fn test_add_and_sub() {
        assert_eq!(usd("1.10") + usd("2.25"), usd("3.35"));
        assert_eq!(usd("5.00") - usd("1.01"), usd("3.99"));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        assert_eq!(usd("1.00").saturating_sub(usd("3.00")), usd("0"));
        assert_eq!(usd("3.00").saturating_sub(usd("1.00")), usd("2.00"));
    }

    #[test]
    fn test_display() {
        assert_eq!(usd("19.9").display(), "$19.90");
        assert_eq!(
            Money::from_cents(1250, CurrencyCode::GBP).to_string(),
            "£12.50"
        );
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_serializes_amount_as_string() {
        let json = serde_json::to_value(usd("4.99")).unwrap();
        assert_eq!(json["amount"], "4.99");
        assert_eq!(json["currency"], "USD");
    }
}
