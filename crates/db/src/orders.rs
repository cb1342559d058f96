//! Order repository: placing, listing and moving orders through their lifecycle.
//!
//! Placing an order and every status change that touches stock run in a
//! single transaction with the affected product rows locked, so concurrent
//! checkouts can never oversell.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use freshmart_core::checkout::order_number;
use freshmart_core::pricing::{DiscountPercent, PricedLine, PricingPolicy};
use freshmart_core::{
    CurrencyCode, Money, OrderId, OrderItemId, OrderStatus, Page, PageRequest, PaymentMethod,
    PaymentStatus, ProductId, ProductUnit, UserId,
};

use super::products::{PRODUCT_SELECT, ProductRow};
use super::users::escape_like;
use super::{RepositoryError, count, non_negative};
use crate::models::{DeliveryAddress, Order, OrderItem, Product};

const ORDER_SELECT: &str = "
    SELECT o.id, o.order_number, o.user_id, o.status, o.payment_method, o.payment_status,
           o.recipient, o.address_line1, o.address_line2, o.city, o.region, o.postal_code,
           o.phone, o.notes, o.currency, o.subtotal, o.discount_total, o.delivery_fee,
           o.total, o.placed_at, o.updated_at,
           (SELECT COALESCE(SUM(i.quantity), 0)::BIGINT
              FROM shop.order_item i WHERE i.order_id = o.id) AS item_count
    FROM shop.order o";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    recipient: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    region: Option<String>,
    postal_code: String,
    phone: Option<String>,
    notes: Option<String>,
    currency: String,
    subtotal: Decimal,
    discount_total: Decimal,
    delivery_fee: Decimal,
    total: Decimal,
    placed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    item_count: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = row
            .currency
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;
        let money = |amount| Money::new(amount, currency);

        Ok(Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            user_id: UserId::new(row.user_id),
            status: row.status,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            delivery: DeliveryAddress {
                recipient: row.recipient,
                line1: row.address_line1,
                line2: row.address_line2,
                city: row.city,
                region: row.region,
                postal_code: row.postal_code,
                phone: row.phone,
            },
            notes: row.notes,
            currency,
            item_count: u32::try_from(row.item_count).unwrap_or(u32::MAX),
            subtotal: money(row.subtotal),
            discount_total: money(row.discount_total),
            delivery_fee: money(row.delivery_fee),
            total: money(row.total),
            placed_at: row.placed_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    product_id: Option<i32>,
    product_name: String,
    product_slug: String,
    unit: ProductUnit,
    unit_price: Decimal,
    discount_percent: i32,
    quantity: i32,
    line_total: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            product_id: row.product_id.map(ProductId::new),
            product_name: row.product_name,
            product_slug: row.product_slug,
            unit: row.unit,
            unit_price: row.unit_price,
            discount_percent: DiscountPercent::new(row.discount_percent)
                .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?,
            quantity: non_negative(row.quantity, "order item quantity")?,
            line_total: row.line_total,
        })
    }
}

/// Everything needed to turn a user's cart into an order.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub delivery: &'a DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<&'a str>,
    pub pricing: &'a PricingPolicy,
}

/// Reasons an order could not be placed.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("{name} is no longer available")]
    Unavailable { product_id: ProductId, name: String },

    #[error("only {available} of {name} left in stock")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: u32,
    },

    #[error("minimum order is {minimum}")]
    BelowMinimum { minimum: Money },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Reasons an order status could not be changed.
#[derive(Debug, Error)]
pub enum StatusChangeError {
    #[error("order not found")]
    NotFound,

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for StatusChangeError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Filters for the back-office order list.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order number, recipient or customer email.
    pub q: Option<String>,
    pub user_id: Option<UserId>,
}

/// Figures for the back-office dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: u64,
    pub orders_today: u64,
    /// Sum of totals over orders that were not cancelled.
    pub revenue: Decimal,
    pub revenue_today: Decimal,
    pub by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

fn push_order_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    query.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        query.push(" AND o.status = ").push_bind(status);
    }
    if let Some(user_id) = filter.user_id {
        query.push(" AND o.user_id = ").push_bind(user_id);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query
            .push(" AND (o.order_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.recipient ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM shop.user u WHERE u.id = o.user_id AND u.email ILIKE ")
            .push_bind(pattern)
            .push("))");
    }
}

/// Put the stock of every item of an order back.
async fn restock(conn: &mut PgConnection, order_id: OrderId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE shop.product p SET stock = p.stock + i.quantity
         FROM shop.order_item i
         WHERE i.order_id = $1 AND i.product_id = p.id",
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Lock an order row and return its owner, status, payment method and payment status.
async fn lock_order(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<(i32, OrderStatus, PaymentMethod, PaymentStatus)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT user_id, status, payment_method, payment_status
         FROM shop.order WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Payment status after an order moves to `next`.
const fn payment_after(
    next: OrderStatus,
    method: PaymentMethod,
    current: PaymentStatus,
) -> PaymentStatus {
    match (next, method, current) {
        (OrderStatus::Cancelled, _, PaymentStatus::Paid) => PaymentStatus::Refunded,
        (OrderStatus::Delivered, PaymentMethod::CashOnDelivery, PaymentStatus::Unpaid) => {
            PaymentStatus::Paid
        }
        _ => current,
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's server-side cart into an order.
    ///
    /// In one transaction: lock the cart and its products, check availability
    /// and stock, price every line, insert the order with an address snapshot,
    /// decrement stock and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a `PlaceOrderError` describing the first problem found; nothing
    /// is written in that case.
    pub async fn place(&self, new: NewOrder<'_>) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let cart: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT product_id, quantity FROM shop.cart_item
             WHERE user_id = $1
             ORDER BY position, added_at, product_id
             FOR UPDATE",
        )
        .bind(new.user_id)
        .fetch_all(&mut *tx)
        .await?;
        if cart.is_empty() {
            return Err(PlaceOrderError::EmptyCart);
        }

        let ids: Vec<i32> = cart.iter().map(|(id, _)| *id).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = ANY($1) ORDER BY p.id FOR UPDATE OF p"
        ))
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;
        let products: HashMap<ProductId, Product> = rows
            .into_iter()
            .map(|row| Product::try_from(row).map(|p| (p.id, p)))
            .collect::<Result<_, _>>()?;

        let mut lines: Vec<(&Product, u32)> = Vec::with_capacity(cart.len());
        for (product_id, quantity) in cart {
            let product_id = ProductId::new(product_id);
            let quantity = non_negative(quantity, "cart quantity")?;
            let Some(product) = products.get(&product_id).filter(|p| p.is_active) else {
                let name = products
                    .get(&product_id)
                    .map_or_else(|| format!("product {product_id}"), |p| p.name.clone());
                return Err(PlaceOrderError::Unavailable { product_id, name });
            };
            if product.stock < quantity {
                return Err(PlaceOrderError::InsufficientStock {
                    product_id,
                    name: product.name.clone(),
                    available: product.stock,
                });
            }
            lines.push((product, quantity));
        }

        let priced: Vec<PricedLine> = lines.iter().map(|(p, q)| p.priced(*q)).collect();
        let totals = new.pricing.totals(&priced);
        if !new.pricing.meets_minimum(&totals) {
            return Err(PlaceOrderError::BelowMinimum {
                minimum: new.pricing.money(new.pricing.minimum_order),
            });
        }

        let number = order_number(Utc::now(), &mut rand::rng());
        let d = new.delivery;
        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.order
                (order_number, user_id, payment_method, recipient, address_line1, address_line2,
                 city, region, postal_code, phone, notes, currency,
                 subtotal, discount_total, delivery_fee, total)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING id",
        )
        .bind(&number)
        .bind(new.user_id)
        .bind(new.payment_method)
        .bind(&d.recipient)
        .bind(&d.line1)
        .bind(d.line2.as_deref())
        .bind(&d.city)
        .bind(d.region.as_deref())
        .bind(&d.postal_code)
        .bind(d.phone.as_deref())
        .bind(new.notes)
        .bind(new.pricing.currency.code())
        .bind(totals.subtotal.amount())
        .bind(totals.discount_total.amount())
        .bind(totals.delivery_fee.amount())
        .bind(totals.total.amount())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "order number collision, please retry"))?;

        for ((product, quantity), line) in lines.iter().zip(&priced) {
            let quantity_param = i32::try_from(*quantity).unwrap_or(i32::MAX);
            sqlx::query(
                "INSERT INTO shop.order_item
                    (order_id, product_id, product_name, product_slug, unit, unit_price,
                     discount_percent, quantity, line_total)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(order_id)
            .bind(product.id)
            .bind(&product.name)
            .bind(product.slug.as_str())
            .bind(product.unit)
            .bind(product.price)
            .bind(i32::from(product.discount))
            .bind(quantity_param)
            .bind(line.net_total())
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE shop.product SET stock = stock - $2 WHERE id = $1")
                .bind(product.id)
                .bind(quantity_param)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
            .bind(new.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            order_number = %number,
            user_id = %new.user_id,
            total = %totals.total,
            "Order placed"
        );

        self.get(OrderId::new(order_id))
            .await?
            .ok_or(PlaceOrderError::Repository(RepositoryError::NotFound))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// An order, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.id = $1 AND o.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, product_id, product_name, product_slug, unit, unit_price,
                    discount_percent, quantity, line_total
             FROM shop.order_item WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM shop.order o");
        push_order_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::new(ORDER_SELECT);
        push_order_filter(&mut query, filter);
        query
            .push(" ORDER BY o.placed_at DESC, o.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<OrderRow> = query.build_query_as().fetch_all(self.pool).await?;
        let orders = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Order>, _>>()?;

        Ok(Page::new(orders, page, count(total)))
    }

    /// Cancel on behalf of the customer who placed the order, restocking its items.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotFound` if the order does not belong to the user.
    /// Returns `StatusChangeError::InvalidTransition` once the order is being prepared.
    pub async fn cancel_for_customer(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Order, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let (owner, status, method, payment) = lock_order(&mut tx, id)
            .await?
            .ok_or(StatusChangeError::NotFound)?;
        if owner != user_id.as_i32() {
            return Err(StatusChangeError::NotFound);
        }
        if !status.is_customer_cancellable() {
            return Err(StatusChangeError::InvalidTransition {
                from: status,
                to: OrderStatus::Cancelled,
            });
        }

        restock(&mut tx, id).await?;
        sqlx::query("UPDATE shop.order SET status = $2, payment_status = $3 WHERE id = $1")
            .bind(id)
            .bind(OrderStatus::Cancelled)
            .bind(payment_after(OrderStatus::Cancelled, method, payment))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, user_id = %user_id, "Order cancelled by customer");

        self.get(id).await?.ok_or(StatusChangeError::NotFound)
    }

    /// Move an order to `next`, enforcing the lifecycle.
    ///
    /// Cancelling restocks the items and refunds a paid order. Delivering a
    /// cash-on-delivery order marks it paid.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotFound` if the order does not exist.
    /// Returns `StatusChangeError::InvalidTransition` if the move is not allowed.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let (_, status, method, payment) = lock_order(&mut tx, id)
            .await?
            .ok_or(StatusChangeError::NotFound)?;
        if !status.can_transition_to(next) {
            return Err(StatusChangeError::InvalidTransition {
                from: status,
                to: next,
            });
        }

        if next == OrderStatus::Cancelled {
            restock(&mut tx, id).await?;
        }
        sqlx::query("UPDATE shop.order SET status = $2, payment_status = $3 WHERE id = $1")
            .bind(id)
            .bind(next)
            .bind(payment_after(next, method, payment))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, from = %status, to = %next, "Order status changed");

        self.get(id).await?.ok_or(StatusChangeError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_payment_status(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query("UPDATE shop.order SET payment_status = $2 WHERE id = $1")
            .bind(id)
            .bind(payment_status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Most recent orders across all customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let page = self
            .list(&OrderFilter::default(), PageRequest::new(1, limit))
            .await?;
        Ok(page.items)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let (total_orders, orders_today, revenue, revenue_today): (
            i64,
            i64,
            Option<Decimal>,
            Option<Decimal>,
        ) = sqlx::query_as(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE placed_at >= date_trunc('day', NOW())),
                    SUM(total) FILTER (WHERE status <> 'cancelled'),
                    SUM(total) FILTER (WHERE status <> 'cancelled'
                                         AND placed_at >= date_trunc('day', NOW()))
             FROM shop.order",
        )
        .fetch_one(self.pool)
        .await?;

        let counts: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM shop.order GROUP BY status")
                .fetch_all(self.pool)
                .await?;
        let by_status = OrderStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: counts
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, n)| count(*n)),
            })
            .collect();

        Ok(OrderStats {
            total_orders: count(total_orders),
            orders_today: count(orders_today),
            revenue: revenue.unwrap_or(Decimal::ZERO),
            revenue_today: revenue_today.unwrap_or(Decimal::ZERO),
            by_status,
        })
    }
}
