//! Cart service.
//!
//! One API over two stores: anonymous shoppers keep a [`GuestCart`] in their
//! session, signed-in shoppers keep lines in `shop.cart_item`. Every mutation
//! returns the full recomputed [`CartView`] so the SPA can replace its state
//! wholesale.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use freshmart_core::cart::{
    CartLine, GuestCart, MAX_LINE_QUANTITY, Quantity, QuantityError, merge_lines,
};
use freshmart_core::pricing::{OrderTotals, PricedLine, PricingPolicy};
use freshmart_core::{Money, ProductId, UserId};
use freshmart_db::models::Product;
use freshmart_db::{CartRepository, ProductRepository, RepositoryError};

use crate::models::{ProductSummary, session_keys};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product not found")]
    ProductNotFound,

    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    #[error("only {available} of {name} in stock")]
    ExceedsStock { name: String, available: u32 },

    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// One cart line with current product data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product: ProductSummary,
    pub quantity: u32,
    /// Discounted price per unit.
    pub unit_price: Money,
    pub line_total: Money,
    pub line_savings: Money,
    /// Units currently in stock.
    pub available: u32,
    pub exceeds_stock: bool,
}

/// The whole cart, priced.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub totals: OrderTotals,
    pub amount_to_free_delivery: Money,
    pub meets_minimum: bool,
    pub minimum_order: Money,
}

impl CartView {
    /// Price `lines` against the given products.
    ///
    /// Lines whose product is missing or inactive are left out.
    #[must_use]
    pub fn build(
        lines: &[CartLine],
        products: &HashMap<ProductId, Product>,
        pricing: &PricingPolicy,
    ) -> Self {
        let mut views = Vec::with_capacity(lines.len());
        let mut priced = Vec::with_capacity(lines.len());

        for line in lines {
            let Some(product) = products.get(&line.product_id).filter(|p| p.is_active) else {
                continue;
            };
            let p: PricedLine = product.priced(line.quantity);
            views.push(CartLineView {
                product: ProductSummary::new(product, pricing),
                quantity: line.quantity,
                unit_price: pricing.money(p.unit_net_price()),
                line_total: pricing.money(p.net_total()),
                line_savings: pricing.money(p.savings()),
                available: product.stock,
                exceeds_stock: line.quantity > product.stock,
            });
            priced.push(p);
        }

        let totals = pricing.totals(&priced);
        Self {
            lines: views,
            amount_to_free_delivery: pricing.amount_to_free_delivery(&totals),
            meets_minimum: pricing.meets_minimum(&totals),
            minimum_order: pricing.money(pricing.minimum_order),
            totals,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether every line can be fulfilled from current stock.
    #[must_use]
    pub fn all_in_stock(&self) -> bool {
        self.lines.iter().all(|l| !l.exceeds_stock)
    }
}

/// Largest quantity of `product` a cart line may hold.
fn line_cap(product: &Product) -> u32 {
    product.stock.min(MAX_LINE_QUANTITY)
}

/// Cart operations for one request.
pub struct CartService<'a> {
    pool: &'a PgPool,
    pricing: &'a PricingPolicy,
    session: &'a Session,
    user_id: Option<UserId>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        pricing: &'a PricingPolicy,
        session: &'a Session,
        user_id: Option<UserId>,
    ) -> Self {
        Self {
            pool,
            pricing,
            session,
            user_id,
        }
    }

    async fn guest_cart(&self) -> Result<GuestCart, CartError> {
        Ok(self
            .session
            .get::<GuestCart>(session_keys::GUEST_CART)
            .await?
            .unwrap_or_default())
    }

    async fn save_guest_cart(&self, cart: &GuestCart) -> Result<(), CartError> {
        self.session.insert(session_keys::GUEST_CART, cart).await?;
        Ok(())
    }

    /// Raw lines, in display order.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be loaded.
    pub async fn lines(&self) -> Result<Vec<CartLine>, CartError> {
        match self.user_id {
            Some(user_id) => Ok(CartRepository::new(self.pool).lines(user_id).await?),
            None => Ok(self.guest_cart().await?.lines().to_vec()),
        }
    }

    /// The current cart, priced.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart or its products cannot be loaded.
    pub async fn view(&self) -> Result<CartView, CartError> {
        let lines = self.lines().await?;
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        let products = ProductRepository::new(self.pool).get_many(&ids).await?;
        let products: HashMap<ProductId, Product> =
            products.into_iter().map(|p| (p.id, p)).collect();
        Ok(CartView::build(&lines, &products, self.pricing))
    }

    /// Total units in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be loaded.
    pub async fn count(&self) -> Result<u32, CartError> {
        match self.user_id {
            Some(user_id) => Ok(CartRepository::new(self.pool).count(user_id).await?),
            None => Ok(self.guest_cart().await?.total_quantity()),
        }
    }

    async fn purchasable(&self, product_id: ProductId) -> Result<Product, CartError> {
        let product = ProductRepository::new(self.pool)
            .get_by_id(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CartError::ProductNotFound)?;
        if !product.in_stock() {
            return Err(CartError::OutOfStock { name: product.name });
        }
        Ok(product)
    }

    /// Add to the existing quantity, clamped to stock and the per-line maximum.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for unknown or inactive products.
    /// Returns `CartError::OutOfStock` if nothing is in stock.
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<CartView, CartError> {
        let quantity = Quantity::new(quantity)?.get();
        let product = self.purchasable(product_id).await?;
        let cap = line_cap(&product);

        match self.user_id {
            Some(user_id) => {
                CartRepository::new(self.pool)
                    .add(user_id, product_id, quantity, cap)
                    .await?;
            }
            None => {
                let mut cart = self.guest_cart().await?;
                let total = cart.add(product_id, quantity);
                if total > cap {
                    cart.set(product_id, cap);
                }
                self.save_guest_cart(&cart).await?;
            }
        }

        tracing::debug!(product_id = %product_id, quantity, "Added to cart");
        self.view().await
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ExceedsStock` if more is requested than is in stock.
    pub async fn set(&self, product_id: ProductId, quantity: u32) -> Result<CartView, CartError> {
        if quantity == 0 {
            return self.remove(product_id).await;
        }
        let quantity = Quantity::new(quantity)?.get();
        let product = self.purchasable(product_id).await?;
        if quantity > product.stock {
            return Err(CartError::ExceedsStock {
                name: product.name,
                available: product.stock,
            });
        }

        match self.user_id {
            Some(user_id) => {
                CartRepository::new(self.pool)
                    .set(user_id, product_id, quantity)
                    .await?;
            }
            None => {
                let mut cart = self.guest_cart().await?;
                cart.set(product_id, quantity);
                self.save_guest_cart(&cart).await?;
            }
        }
        self.view().await
    }

    /// Remove a line. Removing a missing line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be updated.
    pub async fn remove(&self, product_id: ProductId) -> Result<CartView, CartError> {
        match self.user_id {
            Some(user_id) => {
                CartRepository::new(self.pool)
                    .remove(user_id, product_id)
                    .await?;
            }
            None => {
                let mut cart = self.guest_cart().await?;
                if cart.remove(product_id) {
                    self.save_guest_cart(&cart).await?;
                }
            }
        }
        self.view().await
    }

    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be updated.
    pub async fn clear(&self) -> Result<CartView, CartError> {
        match self.user_id {
            Some(user_id) => CartRepository::new(self.pool).clear(user_id).await?,
            None => {
                self.session
                    .remove::<GuestCart>(session_keys::GUEST_CART)
                    .await?;
            }
        }
        self.view().await
    }

    /// Merge `incoming` lines (the SPA's local cart, or a past order) into the
    /// current cart, clamping every line to current stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart or its products cannot be loaded.
    pub async fn merge(&self, incoming: &[CartLine]) -> Result<CartView, CartError> {
        let current = self.lines().await?;
        let merged = self.merge_with_stock(&current, incoming).await?;

        match self.user_id {
            Some(user_id) => {
                CartRepository::new(self.pool)
                    .replace(user_id, &merged)
                    .await?;
            }
            None => self.save_guest_cart(&GuestCart::from_lines(merged)).await?,
        }
        self.view().await
    }

    async fn merge_with_stock(
        &self,
        current: &[CartLine],
        incoming: &[CartLine],
    ) -> Result<Vec<CartLine>, CartError> {
        let ids: Vec<ProductId> = current
            .iter()
            .chain(incoming)
            .map(|l| l.product_id)
            .collect();
        let stock: HashMap<ProductId, u32> = ProductRepository::new(self.pool)
            .get_many(&ids)
            .await?
            .into_iter()
            .filter(|p| p.is_active)
            .map(|p| (p.id, p.stock))
            .collect();

        Ok(merge_lines(current, incoming, |id| stock.get(&id).copied()))
    }

    /// Move the session's guest cart into `user_id`'s server cart.
    ///
    /// Called right after sign-in; the guest cart is removed from the session.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if either cart cannot be loaded or saved.
    pub async fn absorb_guest_cart(&self, user_id: UserId) -> Result<(), CartError> {
        let Some(guest) = self
            .session
            .remove::<GuestCart>(session_keys::GUEST_CART)
            .await?
        else {
            return Ok(());
        };
        if guest.is_empty() {
            return Ok(());
        }

        let repo = CartRepository::new(self.pool);
        let server = repo.lines(user_id).await?;
        let merged = self.merge_with_stock(&server, guest.lines()).await?;
        repo.replace(user_id, &merged).await?;

        tracing::info!(user_id = %user_id, lines = merged.len(), "Merged guest cart");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use freshmart_core::pricing::DiscountPercent;
    use freshmart_core::{ProductUnit, Slug};
    use rust_decimal::Decimal;

    fn product(id: i32, price: &str, discount: i32, stock: u32, active: bool) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: None,
            category_name: None,
            category_slug: None,
            name: format!("Product {id}"),
            slug: Slug::parse(&format!("product-{id}")).unwrap(),
            description: None,
            image_url: None,
            unit: ProductUnit::Each,
            price: price.parse().unwrap(),
            discount: DiscountPercent::new(discount).unwrap(),
            stock,
            is_active: active,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(id), quantity)
    }

    #[test]
    fn test_build_prices_lines_and_totals() {
        let products = catalog(vec![
            product(1, "3.00", 0, 10, true),
            product(2, "10.00", 20, 10, true),
        ]);
        let view = CartView::build(&[line(1, 2), line(2, 1)], &products, &PricingPolicy::default());

        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[1].unit_price.amount(), Decimal::new(800, 2));
        assert_eq!(view.totals.subtotal.amount(), Decimal::new(1600, 2));
        assert_eq!(view.totals.discount_total.amount(), Decimal::new(200, 2));
        // 14.00 net is below the free-delivery threshold
        assert_eq!(view.totals.delivery_fee.amount(), Decimal::new(499, 2));
        assert_eq!(view.totals.total.amount(), Decimal::new(1899, 2));
        assert_eq!(view.amount_to_free_delivery.amount(), Decimal::new(3600, 2));
        assert!(view.meets_minimum);
    }

    #[test]
    fn test_build_skips_missing_and_inactive_products() {
        let products = catalog(vec![
            product(1, "1.00", 0, 5, true),
            product(2, "1.00", 0, 5, false),
        ]);
        let view = CartView::build(
            &[line(1, 1), line(2, 1), line(3, 1)],
            &products,
            &PricingPolicy::default(),
        );
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].product.id, ProductId::new(1));
        assert!(!view.meets_minimum);
    }

    #[test]
    fn test_build_flags_lines_above_stock() {
        let products = catalog(vec![product(1, "20.00", 0, 2, true)]);
        let view = CartView::build(&[line(1, 3)], &products, &PricingPolicy::default());
        assert!(view.lines[0].exceeds_stock);
        assert_eq!(view.lines[0].available, 2);
        assert!(!view.all_in_stock());
    }

    #[test]
    fn test_empty_cart_has_no_delivery_fee() {
        let view = CartView::build(&[], &HashMap::new(), &PricingPolicy::default());
        assert!(view.is_empty());
        assert!(view.totals.delivery_fee.is_zero());
        assert!(view.totals.total.is_zero());
    }

    #[test]
    fn test_line_cap() {
        assert_eq!(line_cap(&product(1, "1.00", 0, 3, true)), 3);
        assert_eq!(line_cap(&product(1, "1.00", 0, 500, true)), MAX_LINE_QUANTITY);
    }
}
