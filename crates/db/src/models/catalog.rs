//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freshmart_core::pricing::{DiscountPercent, PricedLine, discounted_unit_price};
use freshmart_core::{CategoryId, ProductId, ProductUnit, Slug};

/// A product category, with the number of active products in it.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub product_count: u64,
}

/// Fields for creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// A product as stored, with its category joined in.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit: ProductUnit,
    /// List price per unit.
    pub price: Decimal,
    pub discount: DiscountPercent,
    pub stock: u32,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price per unit after the discount.
    #[must_use]
    pub fn sale_price(&self) -> Decimal {
        discounted_unit_price(self.price, self.discount)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether the product can be put in a cart at all.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_active && self.stock > 0
    }

    #[must_use]
    pub const fn priced(&self, quantity: u32) -> PricedLine {
        PricedLine {
            unit_price: self.price,
            discount: self.discount,
            quantity,
        }
    }
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub category_id: Option<CategoryId>,
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub unit: ProductUnit,
    pub price: Decimal,
    #[serde(default)]
    pub discount_percent: DiscountPercent,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

const fn default_true() -> bool {
    true
}

/// Longest product name accepted.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;

impl ProductInput {
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name is required".to_owned());
        }
        if name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
            return Err(format!(
                "name must be at most {MAX_PRODUCT_NAME_LENGTH} characters"
            ));
        }
        if self.price <= Decimal::ZERO {
            return Err("price must be greater than zero".to_owned());
        }
        if self.price.scale() > 2 {
            return Err("price must have at most two decimal places".to_owned());
        }
        if i32::try_from(self.stock).is_err() {
            return Err("stock is too large".to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: &str, discount: i32, stock: u32) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: None,
            category_name: None,
            category_slug: None,
            name: "Bananas".to_owned(),
            slug: Slug::parse("bananas").unwrap(),
            description: None,
            image_url: None,
            unit: ProductUnit::Bunch,
            price: price.parse().unwrap(),
            discount: DiscountPercent::new(discount).unwrap(),
            stock,
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sale_price_and_stock() {
        let p = product("4.00", 25, 3);
        assert_eq!(p.sale_price(), "3.00".parse::<Decimal>().unwrap());
        assert!(p.in_stock());
        assert!(p.is_purchasable());

        let sold_out = product("4.00", 0, 0);
        assert!(!sold_out.in_stock());
        assert!(!sold_out.is_purchasable());
    }

    #[test]
    fn test_product_input_defaults_and_validation() {
        let input: ProductInput =
            serde_json::from_str(r#"{"category_id": null, "name": "Milk", "price": "1.49"}"#)
                .unwrap();
        assert!(input.is_active);
        assert_eq!(input.unit, ProductUnit::Each);
        assert!(input.discount_percent.is_zero());
        assert!(input.validate().is_ok());

        let bad = ProductInput {
            price: Decimal::ZERO,
            ..input.clone()
        };
        assert_eq!(bad.validate().unwrap_err(), "price must be greater than zero");

        let fractional = ProductInput {
            price: "1.499".parse().unwrap(),
            ..input
        };
        assert!(fractional.validate().is_err());
    }
}
