//! Order domain types.
//!
//! Orders keep a snapshot of the delivery address and of each product's name
//! and price at the time of purchase, so later catalog edits never change
//! what a customer was charged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use freshmart_core::pricing::{DiscountPercent, OrderTotals};
use freshmart_core::{
    CurrencyCode, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, ProductUnit, UserId,
};

use super::Address;

/// Delivery address as it was when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryAddress {
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub phone: Option<String>,
}

impl From<&Address> for DeliveryAddress {
    fn from(a: &Address) -> Self {
        Self {
            recipient: a.recipient.clone(),
            line1: a.line1.clone(),
            line2: a.line2.clone(),
            city: a.city.clone(),
            region: a.region.clone(),
            postal_code: a.postal_code.clone(),
            phone: a.phone.clone(),
        }
    }
}

/// A placed order (without its items).
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery: DeliveryAddress,
    pub notes: Option<String>,
    pub currency: CurrencyCode,
    pub item_count: u32,
    pub subtotal: Money,
    pub discount_total: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub const fn totals(&self) -> OrderTotals {
        OrderTotals {
            item_count: self.item_count,
            subtotal: self.subtotal,
            discount_total: self.discount_total,
            delivery_fee: self.delivery_fee,
            total: self.total,
        }
    }

    /// Whether the customer may still cancel this order.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.status.is_customer_cancellable()
    }
}

/// One line of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_slug: String,
    pub unit: ProductUnit,
    /// List price per unit at purchase time.
    pub unit_price: Decimal,
    pub discount_percent: DiscountPercent,
    pub quantity: u32,
    pub line_total: Decimal,
}
