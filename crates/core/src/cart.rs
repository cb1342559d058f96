//! Cart lines, guest carts, and merging a guest cart into a server cart.
//!
//! Anonymous shoppers keep their cart client-side (local storage in the SPA,
//! mirrored in the session on the server). When they sign in, or when the SPA
//! replays its local cart, the two carts are combined with [`merge_lines`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Largest quantity of a single product allowed in a cart.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// A validated line quantity, `1..=MAX_LINE_QUANTITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    /// # Errors
    ///
    /// Returns an error for zero or values above [`MAX_LINE_QUANTITY`].
    pub const fn new(n: u32) -> Result<Self, QuantityError> {
        if n == 0 {
            return Err(QuantityError::Zero);
        }
        if n > MAX_LINE_QUANTITY {
            return Err(QuantityError::TooLarge {
                max: MAX_LINE_QUANTITY,
            });
        }
        Ok(Self(n))
    }

    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One product and how many of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Combine a server cart with a guest cart.
///
/// - Quantities of the same product are summed.
/// - Each result is clamped to `min(MAX_LINE_QUANTITY, stock)`.
/// - Products for which `stock_of` returns `None` (unknown or inactive) or a
///   stock of zero are dropped.
/// - Server lines keep their order and come first; guest-only lines follow in
///   guest order.
pub fn merge_lines<F>(server: &[CartLine], guest: &[CartLine], mut stock_of: F) -> Vec<CartLine>
where
    F: FnMut(ProductId) -> Option<u32>,
{
    let mut order: Vec<ProductId> = Vec::with_capacity(server.len() + guest.len());
    let mut quantities: HashMap<ProductId, u32> = HashMap::new();

    for line in server.iter().chain(guest) {
        if line.quantity == 0 {
            continue;
        }
        let entry = quantities.entry(line.product_id).or_insert_with(|| {
            order.push(line.product_id);
            0
        });
        *entry = entry.saturating_add(line.quantity);
    }

    order
        .into_iter()
        .filter_map(|product_id| {
            let wanted = quantities.get(&product_id).copied()?;
            let stock = stock_of(product_id)?;
            let quantity = wanted.min(stock).min(MAX_LINE_QUANTITY);
            (quantity > 0).then_some(CartLine::new(product_id, quantity))
        })
        .collect()
}

/// Cart held for an anonymous shopper.
///
/// Stored in the session under `guest_cart`; mirrors the SPA's local-storage
/// cart so both stay in step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCart {
    lines: Vec<CartLine>,
}

impl GuestCart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.add(line.product_id, line.quantity);
        }
        cart
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Add to any existing quantity, capping at [`MAX_LINE_QUANTITY`].
    ///
    /// Returns the resulting quantity.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> u32 {
        if quantity == 0 {
            return self.quantity_of(product_id);
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line
                .quantity
                .saturating_add(quantity)
                .min(MAX_LINE_QUANTITY);
            return line.quantity;
        }
        let quantity = quantity.min(MAX_LINE_QUANTITY);
        self.lines.push(CartLine::new(product_id, quantity));
        quantity
    }

    /// Replace the quantity; zero removes the line.
    pub fn set(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        let quantity = quantity.min(MAX_LINE_QUANTITY);
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine::new(product_id, quantity)),
        }
    }

    /// Returns `true` if a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(n: i32) -> ProductId {
        ProductId::new(n)
    }

    fn line(n: i32, q: u32) -> CartLine {
        CartLine::new(pid(n), q)
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(99).unwrap().get(), 99);
        assert!(matches!(
            Quantity::new(100),
            Err(QuantityError::TooLarge { max: 99 })
        ));
    }

    #[test]
    fn test_merge_sums_and_keeps_server_order_first() {
        let server = [line(1, 2), line(2, 1)];
        let guest = [line(3, 4), line(1, 3)];
        let merged = merge_lines(&server, &guest, |_| Some(50));
        assert_eq!(merged, vec![line(1, 5), line(2, 1), line(3, 4)]);
    }

    #[test]
    fn test_merge_clamps_to_stock() {
        let merged = merge_lines(&[line(1, 4)], &[line(1, 4)], |_| Some(6));
        assert_eq!(merged, vec![line(1, 6)]);
    }

    #[test]
    fn test_merge_clamps_to_max_quantity() {
        let merged = merge_lines(&[line(1, 80)], &[line(1, 80)], |_| Some(1000));
        assert_eq!(merged, vec![line(1, MAX_LINE_QUANTITY)]);
    }

    #[test]
    fn test_merge_drops_unavailable_products() {
        let merged = merge_lines(&[line(1, 1)], &[line(2, 1), line(3, 1)], |id| {
            match id.as_i32() {
                1 => Some(0),
                2 => None,
                _ => Some(3),
            }
        });
        assert_eq!(merged, vec![line(3, 1)]);
    }

    #[test]
    fn test_merge_ignores_zero_quantity_lines() {
        let merged = merge_lines(&[], &[line(1, 0), line(2, 2)], |_| Some(10));
        assert_eq!(merged, vec![line(2, 2)]);
    }

    #[test]
    fn test_merge_with_empty_guest_is_server_cart() {
        let server = [line(4, 2), line(5, 1)];
        assert_eq!(merge_lines(&server, &[], |_| Some(10)), server.to_vec());
    }

    #[test]
    fn test_guest_cart_add_and_set() {
        let mut cart = GuestCart::new();
        assert_eq!(cart.add(pid(1), 2), 2);
        assert_eq!(cart.add(pid(1), 3), 5);
        assert_eq!(cart.add(pid(2), 150), MAX_LINE_QUANTITY);
        assert_eq!(cart.total_quantity(), 5 + MAX_LINE_QUANTITY);

        cart.set(pid(1), 1);
        assert_eq!(cart.quantity_of(pid(1)), 1);

        cart.set(pid(1), 0);
        assert_eq!(cart.quantity_of(pid(1)), 0);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_guest_cart_remove_and_clear() {
        let mut cart = GuestCart::from_lines(vec![line(1, 1), line(2, 2), line(1, 1)]);
        assert_eq!(cart.lines(), &[line(1, 2), line(2, 2)]);
        assert!(cart.remove(pid(2)));
        assert!(!cart.remove(pid(2)));
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_guest_cart_serde_roundtrip() {
        let cart = GuestCart::from_lines(vec![line(7, 3)]);
        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(json, r#"{"lines":[{"product_id":7,"quantity":3}]}"#);
        assert_eq!(serde_json::from_str::<GuestCart>(&json).unwrap(), cart);
    }
}
