//! Catalog representations for the back office.
//!
//! Admins see raw decimal prices (the currency is shop-wide) alongside the
//! computed sale price and stock flags.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use freshmart_core::pricing::DiscountPercent;
use freshmart_core::{CategoryId, ProductId, ProductUnit, Slug};
use freshmart_db::models::Product;

#[derive(Debug, Clone, Serialize)]
pub struct AdminProduct {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit: ProductUnit,
    pub price: Decimal,
    pub discount_percent: DiscountPercent,
    pub sale_price: Decimal,
    pub stock: u32,
    pub low_stock: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminProduct {
    /// Products with less than `low_stock_threshold` in stock are flagged.
    #[must_use]
    pub fn new(product: &Product, low_stock_threshold: u32) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            category_name: product.category_name.clone(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            image_url: product.image_url.clone(),
            unit: product.unit,
            price: product.price,
            discount_percent: product.discount,
            sale_price: product.sale_price(),
            stock: product.stock,
            low_stock: product.stock < low_stock_threshold,
            is_active: product.is_active,
            is_featured: product.is_featured,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(stock: u32, discount: i32) -> Product {
        Product {
            id: ProductId::new(3),
            category_id: Some(CategoryId::new(1)),
            category_name: Some("Dairy".to_owned()),
            category_slug: Some("dairy".to_owned()),
            name: "Whole Milk".to_owned(),
            slug: Slug::parse("whole-milk").unwrap(),
            description: None,
            image_url: None,
            unit: ProductUnit::default(),
            price: Decimal::new(250, 2),
            discount: DiscountPercent::new(discount).unwrap(),
            stock,
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_flag_is_strictly_below_threshold() {
        assert!(AdminProduct::new(&product(9, 0), 10).low_stock);
        assert!(!AdminProduct::new(&product(10, 0), 10).low_stock);
        assert!(!AdminProduct::new(&product(0, 0), 0).low_stock);
    }

    #[test]
    fn test_sale_price() {
        let view = AdminProduct::new(&product(5, 20), 10);
        assert_eq!(view.price, Decimal::new(250, 2));
        assert_eq!(view.sale_price, Decimal::new(200, 2));
    }
}
