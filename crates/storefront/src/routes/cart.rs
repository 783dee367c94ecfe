//! Cart route handlers.
//!
//! The cart lives in the session as a product ID to quantity map. Each
//! handler loads it, applies one operation and writes it back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{Cart, Price, ProductId};

use super::PageContext;
use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session_keys;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub subtotal: Price,
    pub stock: u32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub items: Vec<CartItemView>,
    pub total: Price,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub quantity: i64,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session (empty if none).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
///
/// Entries whose product has since been deleted are dropped from the
/// session cart before pricing.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
) -> Result<impl IntoResponse> {
    let mut cart = load_cart(&session).await?;
    let products = ProductRepository::new(state.pool())
        .list_by_ids(&cart.product_ids())
        .await?;

    let known: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let stale = cart.retain_known(&known);
    if !stale.is_empty() {
        tracing::warn!(?stale, "Dropping deleted products from cart");
        save_cart(&session, &cart).await?;
        ctx.cart_count = cart.item_count();
    }

    let summary = cart
        .summarize(&products)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let items = summary
        .lines
        .iter()
        .map(|line| CartItemView {
            product_id: line.product.id,
            name: line.product.name.clone(),
            unit_price: line.product.price,
            quantity: line.quantity,
            subtotal: line.subtotal,
            stock: line.product.stock,
        })
        .collect();

    Ok(CartShowTemplate {
        ctx,
        items,
        total: summary.total,
    })
}

/// Add one unit of a product to the cart.
#[instrument(skip_all)]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    if ProductRepository::new(state.pool()).get(id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(id);
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &id.to_string())]));
    Ok(Redirect::to("/cart"))
}

/// Remove a product from the cart. Unknown IDs are ignored.
#[instrument(skip_all)]
pub async fn remove(session: Session, Path(id): Path<i32>) -> Result<impl IntoResponse> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(ProductId::new(id)) {
        save_cart(&session, &cart).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Set the quantity of a product. Zero or less removes it.
#[instrument(skip_all)]
pub async fn update(
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<UpdateCartForm>,
) -> Result<impl IntoResponse> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(ProductId::new(id), form.quantity);
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}
