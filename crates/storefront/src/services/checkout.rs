//! Checkout: turn the session cart into an order.
//!
//! The products in the cart are locked (`FOR UPDATE`, in ID order) inside a
//! single transaction, the plan is validated against the locked rows, and
//! the order, its items and the stock decrements are written before commit.
//! Any failure rolls the whole thing back.
//!
//! Clearing the session cart is left to the caller, after a successful
//! return. The confirmation email is sent after commit and its failure does
//! not affect the order.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{
    Capability, Cart, CheckoutError, CheckoutLine, OrderId, Price, plan_checkout,
};

use crate::db::{RepositoryError, UserRepository, orders};
use crate::models::CurrentUser;
use crate::services::email::{EmailService, OrderConfirmation};

/// Errors from a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutFailure {
    /// The cart was refused.
    #[error(transparent)]
    Rejected(#[from] CheckoutError),

    /// Database error; the transaction was rolled back.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutFailure {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A committed order.
#[derive(Debug, Clone)]
pub struct CompletedOrder {
    pub order_id: OrderId,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<CheckoutLine>,
    pub total: Price,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    email: Option<&'a EmailService>,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service. Without an email service no
    /// confirmation is sent.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: Option<&'a EmailService>) -> Self {
        Self { pool, email }
    }

    /// Place an order for everything in `cart`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutFailure::Rejected` if the user is not a buyer, the
    /// cart is empty, a product is gone or stock is short. Returns
    /// `CheckoutFailure::Repository` if the database fails. Nothing is
    /// written in either case.
    #[instrument(skip(self, cart), fields(user_id = %user.id, lines = cart.len()))]
    pub async fn checkout(
        &self,
        user: &CurrentUser,
        cart: &Cart,
    ) -> Result<CompletedOrder, CheckoutFailure> {
        // Refuse early without touching the database.
        user.role
            .ensure(Capability::Checkout)
            .map_err(CheckoutError::from)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let mut tx = self.pool.begin().await?;

        let locked = orders::lock_products(&mut tx, &cart.product_ids()).await?;
        let plan = plan_checkout(user.role, cart, &locked)?;

        let (order_id, created_at) = orders::insert_order(&mut tx, user.id).await?;
        for line in &plan.lines {
            orders::insert_item(
                &mut tx,
                order_id,
                line.product_id,
                line.quantity,
                line.unit_price,
            )
            .await?;
            orders::set_stock(&mut tx, line.product_id, line.remaining_stock).await?;
        }

        tx.commit().await?;

        let total = plan.total();
        tracing::info!(order_id = %order_id, total = %total, "Order placed");

        let order = CompletedOrder {
            order_id,
            created_at,
            lines: plan.lines,
            total,
        };
        self.notify(user, &order).await;

        Ok(order)
    }

    /// Send the confirmation email. Failures are logged and reported only.
    async fn notify(&self, user: &CurrentUser, order: &CompletedOrder) {
        let Some(email) = self.email else {
            tracing::debug!("Email not configured, skipping order confirmation");
            return;
        };

        let recipient = match UserRepository::new(self.pool).get_by_id(user.id).await {
            Ok(Some(account)) => account.email,
            Ok(None) => {
                tracing::warn!(user_id = %user.id, "Buyer vanished before confirmation email");
                return;
            }
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to load buyer for confirmation email");
                return;
            }
        };

        let confirmation = OrderConfirmation {
            to: recipient.as_str(),
            username: &user.username,
            order_id: order.order_id,
            lines: &order.lines,
            total: order.total,
        };

        if let Err(e) = email.send_order_confirmation(&confirmation).await {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                error = %e,
                order_id = %order.order_id,
                sentry_event_id = %event_id,
                "Failed to send order confirmation"
            );
        }
    }
}
