//! Product listings and detail pages.

use serde::Serialize;

use freshmart_core::pricing::{DiscountPercent, PricingPolicy};
use freshmart_core::{CategoryId, Money, ProductId, ProductUnit, Slug};
use freshmart_db::models::Product;

/// A product as shown in grids, the cart and the wishlist.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub image_url: Option<String>,
    pub unit: ProductUnit,
    /// List price.
    pub price: Money,
    /// Price after discount.
    pub sale_price: Money,
    pub discount_percent: DiscountPercent,
    pub on_sale: bool,
    pub in_stock: bool,
    pub stock: u32,
    /// Inactive products only appear in wishlists.
    pub is_active: bool,
    pub category_slug: Option<String>,
}

impl ProductSummary {
    #[must_use]
    pub fn new(product: &Product, pricing: &PricingPolicy) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            image_url: product.image_url.clone(),
            unit: product.unit,
            price: pricing.money(product.price),
            sale_price: pricing.money(product.sale_price()),
            discount_percent: product.discount,
            on_sale: !product.discount.is_zero(),
            in_stock: product.in_stock(),
            stock: product.stock,
            is_active: product.is_active,
            category_slug: product.category_slug.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Full product page.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub description: Option<String>,
    pub category: Option<CategoryRef>,
    pub is_featured: bool,
    /// Only present for signed-in shoppers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_wishlist: Option<bool>,
}

impl ProductDetail {
    #[must_use]
    pub fn new(product: &Product, pricing: &PricingPolicy, in_wishlist: Option<bool>) -> Self {
        let category = match (product.category_id, &product.category_name, &product.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef {
                id,
                name: name.clone(),
                slug: slug.clone(),
            }),
            _ => None,
        };
        Self {
            summary: ProductSummary::new(product, pricing),
            description: product.description.clone(),
            category,
            is_featured: product.is_featured,
            in_wishlist,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product() -> Product {
        Product {
            id: ProductId::new(9),
            category_id: Some(CategoryId::new(2)),
            category_name: Some("Fruit".to_owned()),
            category_slug: Some("fruit".to_owned()),
            name: "Mango".to_owned(),
            slug: Slug::parse("mango").unwrap(),
            description: Some("Ripe".to_owned()),
            image_url: None,
            unit: ProductUnit::Each,
            price: "2.00".parse().unwrap(),
            discount: DiscountPercent::new(50).unwrap(),
            stock: 4,
            is_active: true,
            is_featured: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_prices() {
        let summary = ProductSummary::new(&product(), &PricingPolicy::default());
        assert_eq!(summary.price.display(), "$2.00");
        assert_eq!(summary.sale_price.display(), "$1.00");
        assert!(summary.on_sale);
        assert!(summary.in_stock);
    }

    #[test]
    fn test_detail_serialization() {
        let detail = ProductDetail::new(&product(), &PricingPolicy::default(), None);
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Mango");
        assert_eq!(json["category"]["slug"], "fruit");
        assert!(json.get("in_wishlist").is_none());

        let detail = ProductDetail::new(&product(), &PricingPolicy::default(), Some(true));
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["in_wishlist"], true);
    }
}
