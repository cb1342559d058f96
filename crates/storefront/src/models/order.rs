//! Order history views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use freshmart_core::pricing::DiscountPercent;
use freshmart_core::{
    CurrencyCode, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, ProductUnit,
};
use freshmart_db::models::{DeliveryAddress, Order, OrderItem};

/// One row of the order history list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub item_count: u32,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
    pub can_cancel: bool,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            payment_status: order.payment_status,
            item_count: order.item_count,
            total: order.total,
            placed_at: order.placed_at,
            can_cancel: order.can_cancel(),
        }
    }
}

/// A purchased line, priced in the order's currency.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_slug: String,
    pub unit: ProductUnit,
    pub unit_price: Money,
    pub discount_percent: DiscountPercent,
    pub quantity: u32,
    pub line_total: Money,
}

impl OrderItemView {
    fn new(item: &OrderItem, currency: CurrencyCode) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_slug: item.product_slug.clone(),
            unit: item.unit,
            unit_price: Money::new(item.unit_price, currency),
            discount_percent: item.discount_percent,
            quantity: item.quantity,
            line_total: Money::new(item.line_total, currency),
        }
    }
}

/// Full order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub payment_method: PaymentMethod,
    pub delivery: DeliveryAddress,
    pub notes: Option<String>,
    pub subtotal: Money,
    pub discount_total: Money,
    pub delivery_fee: Money,
    pub items: Vec<OrderItemView>,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: &Order, items: &[OrderItem]) -> Self {
        Self {
            summary: OrderSummary::from(order),
            payment_method: order.payment_method,
            delivery: order.delivery.clone(),
            notes: order.notes.clone(),
            subtotal: order.subtotal,
            discount_total: order.discount_total,
            delivery_fee: order.delivery_fee,
            items: items
                .iter()
                .map(|item| OrderItemView::new(item, order.currency))
                .collect(),
        }
    }
}
