//! Checkout and order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::PageContext;
use super::cart::{load_cart, save_cart};
use crate::db::OrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::OrderSummary;
use crate::services::checkout::{CheckoutService, CompletedOrder};
use crate::state::AppState;

/// Order placed page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/complete.html")]
pub struct OrderCompleteTemplate {
    pub ctx: PageContext,
    pub order: CompletedOrder,
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderSummary>,
}

/// Turn the session cart into an order.
///
/// The cart is cleared only after the order is committed.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
) -> Result<impl IntoResponse> {
    let mut cart = load_cart(&session).await?;

    let order = CheckoutService::new(state.pool(), state.email())
        .checkout(&user, &cart)
        .await?;

    cart.clear();
    save_cart(&session, &cart).await?;
    ctx.cart_count = 0;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.order_id.to_string())]),
    );

    Ok(OrderCompleteTemplate { ctx, order })
}

/// Display the caller's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(OrdersTemplate { ctx, orders })
}
