//! Checkout flow.
//!
//! The draft (address, payment method, notes) lives in the session under
//! `checkout`; the cart is always the signed-in user's server cart.

use serde::Serialize;
use sqlx::PgPool;
use tower_sessions::Session;

use freshmart_core::checkout::{CheckoutDraft, CheckoutStep};
use freshmart_core::pricing::PricingPolicy;
use freshmart_core::{AddressId, PaymentMethod, UserId};
use freshmart_db::models::{Address, DeliveryAddress};
use freshmart_db::{AddressRepository, NewOrder, OrderRepository};

use crate::error::{AppError, Result};
use crate::models::{OrderDetail, session_keys};
use crate::services::cart::{CartService, CartView};

/// Everything the checkout page needs in one response.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub draft: CheckoutDraft,
    pub cart: CartView,
    /// The selected delivery address.
    pub address: Option<Address>,
}

/// Checkout operations for one signed-in shopper.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    pricing: &'a PricingPolicy,
    session: &'a Session,
    user_id: UserId,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        pricing: &'a PricingPolicy,
        session: &'a Session,
        user_id: UserId,
    ) -> Self {
        Self {
            pool,
            pricing,
            session,
            user_id,
        }
    }

    fn cart(&self) -> CartService<'a> {
        CartService::new(self.pool, self.pricing, self.session, Some(self.user_id))
    }

    async fn draft(&self) -> Result<CheckoutDraft> {
        Ok(self
            .session
            .get::<CheckoutDraft>(session_keys::CHECKOUT)
            .await?
            .unwrap_or_default())
    }

    async fn save_draft(&self, draft: &CheckoutDraft) -> Result<()> {
        self.session.insert(session_keys::CHECKOUT, draft).await?;
        Ok(())
    }

    /// Resolve the draft's address, falling back to the default address.
    ///
    /// A draft pointing at a deleted address is reset to the default.
    async fn selected_address(&self, draft: &mut CheckoutDraft) -> Result<Option<Address>> {
        let repo = AddressRepository::new(self.pool);
        if let Some(id) = draft.address_id
            && let Some(address) = repo.get(self.user_id, id).await?
        {
            return Ok(Some(address));
        }

        let address = repo.get_default(self.user_id).await?;
        draft.address_id = address.as_ref().map(|a| a.id);
        Ok(address)
    }

    /// Current step, draft, cart and address.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the session or database cannot be read.
    pub async fn view(&self) -> Result<CheckoutView> {
        let mut draft = self.draft().await?;
        let before = draft.address_id;
        let address = self.selected_address(&mut draft).await?;
        if draft.address_id != before {
            self.save_draft(&draft).await?;
        }

        let cart = self.cart().view().await?;
        Ok(CheckoutView {
            step: draft.current_step(cart.is_empty()),
            draft,
            cart,
            address,
        })
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the address is not the shopper's.
    pub async fn set_address(&self, address_id: AddressId) -> Result<CheckoutView> {
        AddressRepository::new(self.pool)
            .get(self.user_id, address_id)
            .await?
            .ok_or_else(|| AppError::NotFound("address".to_owned()))?;

        let mut draft = self.draft().await?;
        draft.address_id = Some(address_id);
        self.save_draft(&draft).await?;
        self.view().await
    }

    /// # Errors
    ///
    /// Returns `AppError` if the session cannot be updated.
    pub async fn set_payment(&self, method: PaymentMethod) -> Result<CheckoutView> {
        let mut draft = self.draft().await?;
        draft.payment_method = Some(method);
        self.save_draft(&draft).await?;
        self.view().await
    }

    /// # Errors
    ///
    /// Returns `AppError` if the session cannot be updated.
    pub async fn set_notes(&self, notes: &str) -> Result<CheckoutView> {
        let mut draft = self.draft().await?;
        draft.set_notes(notes);
        self.save_draft(&draft).await?;
        self.view().await
    }

    /// Place the order and clear the draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` or `AppError::Conflict` if a step is
    /// incomplete, the minimum is not met, or stock ran out.
    pub async fn place(&self) -> Result<OrderDetail> {
        let mut draft = self.draft().await?;
        let address = self.selected_address(&mut draft).await?;
        let cart_is_empty = self.cart().count().await? == 0;
        draft.ensure_ready(cart_is_empty)?;

        let (Some(address), Some(payment_method)) = (address, draft.payment_method) else {
            return Err(AppError::Internal("checkout draft incomplete".to_owned()));
        };
        let delivery = DeliveryAddress::from(&address);

        let orders = OrderRepository::new(self.pool);
        let order = orders
            .place(NewOrder {
                user_id: self.user_id,
                delivery: &delivery,
                payment_method,
                notes: draft.notes.as_deref(),
                pricing: self.pricing,
            })
            .await?;
        let items = orders.items(order.id).await?;

        self.session
            .remove::<CheckoutDraft>(session_keys::CHECKOUT)
            .await?;

        Ok(OrderDetail::new(&order, &items))
    }
}
