//! Order representations for the back office.

use serde::Serialize;

use freshmart_core::{Email, UserId};
use freshmart_db::models::{Order, OrderItem, User};

/// The customer who placed an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
}

impl From<&User> for OrderCustomer {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// An order with its items and the customer.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// `None` if the account no longer exists.
    pub customer: Option<OrderCustomer>,
    /// Statuses the order may move to next.
    pub next_statuses: Vec<freshmart_core::OrderStatus>,
}

impl AdminOrderDetail {
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItem>, customer: Option<&User>) -> Self {
        let next_statuses = freshmart_core::OrderStatus::ALL
            .iter()
            .copied()
            .filter(|next| order.status.can_transition_to(*next))
            .collect();
        Self {
            order,
            items,
            customer: customer.map(OrderCustomer::from),
            next_statuses,
        }
    }
}
