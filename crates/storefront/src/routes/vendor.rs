//! Vendor route handlers: stores, products and sales.
//!
//! Every handler requires a vendor. Store-scoped pages only resolve stores
//! the caller owns; anyone else's store is a 404.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{StoreId, UserId};

use super::PageContext;
use super::twitter::announce_store;
use crate::db::{OrderRepository, ProductRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireVendor;
use crate::models::{NewProduct, NewStore, Product, Store, VendorOrderLine};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Store form data.
#[derive(Debug, Default, Deserialize)]
pub struct StoreForm {
    pub name: String,
}

/// Product form data. Numbers arrive as text so bad input can be echoed back.
#[derive(Debug, Default, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub stock: String,
    #[serde(default)]
    pub image: String,
}

impl ProductForm {
    fn parse(&self) -> std::result::Result<NewProduct, String> {
        let stock = self
            .stock
            .trim()
            .parse::<i64>()
            .map_err(|_| "stock: must be a whole number".to_string())?;
        NewProduct::parse(
            &self.name,
            Some(&self.description),
            &self.price,
            stock,
            Some(&self.image),
        )
        .map_err(|e| e.to_string())
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Vendor store list ("manage store") template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/stores.html")]
pub struct StoresTemplate {
    pub ctx: PageContext,
    pub stores: Vec<Store>,
    pub twitter_enabled: bool,
    pub twitter_connected: bool,
}

/// New store form template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/store_form.html")]
pub struct StoreFormTemplate {
    pub ctx: PageContext,
    pub form: StoreForm,
    pub error: Option<String>,
}

/// Products of one store template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/products.html")]
pub struct StoreProductsTemplate {
    pub ctx: PageContext,
    pub store: Store,
    pub products: Vec<Product>,
}

/// New product form template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/product_form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub store: Store,
    pub form: ProductForm,
    pub error: Option<String>,
}

/// Vendor sales template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/orders.html")]
pub struct VendorOrdersTemplate {
    pub ctx: PageContext,
    pub lines: Vec<VendorOrderLine>,
}

/// Resolve a store the vendor owns.
async fn owned_store(state: &AppState, id: i32, owner: UserId) -> Result<Store> {
    let id = StoreId::new(id);
    StoreRepository::new(state.pool())
        .get_owned(id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))
}

// =============================================================================
// Stores
// =============================================================================

/// Display the vendor's stores.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn manage_store(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(user): RequireVendor,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let stores = StoreRepository::new(state.pool())
        .list_by_owner(user.id)
        .await?;
    let twitter_connected = super::twitter::session_token(&session).await?.is_some();

    Ok(StoresTemplate {
        ctx,
        stores,
        twitter_enabled: state.config().twitter.is_some(),
        twitter_connected,
    })
}

/// Display the new store form.
pub async fn create_store_page(
    RequireVendor(_user): RequireVendor,
    ctx: PageContext,
) -> impl IntoResponse {
    StoreFormTemplate {
        ctx,
        form: StoreForm::default(),
        error: None,
    }
}

/// Handle new store form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_store(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(user): RequireVendor,
    ctx: PageContext,
    Form(form): Form<StoreForm>,
) -> Result<Response> {
    let input = match NewStore::parse(&form.name) {
        Ok(input) => input,
        Err(e) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                StoreFormTemplate {
                    ctx,
                    form,
                    error: Some(e.to_string()),
                },
            )
                .into_response());
        }
    };

    let store = StoreRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    tracing::info!(store_id = %store.id, "Store created");

    announce_store(&state, &session, &store).await;

    Ok(Redirect::to("/manage-store").into_response())
}

// =============================================================================
// Products
// =============================================================================

/// Display the products of one of the vendor's stores.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn store_products(
    State(state): State<AppState>,
    RequireVendor(user): RequireVendor,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let store = owned_store(&state, id, user.id).await?;
    let products = ProductRepository::new(state.pool())
        .list_by_store(store.id)
        .await?;

    Ok(StoreProductsTemplate {
        ctx,
        store,
        products,
    })
}

/// Display the new product form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_product_page(
    State(state): State<AppState>,
    RequireVendor(user): RequireVendor,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let store = owned_store(&state, id, user.id).await?;

    Ok(ProductFormTemplate {
        ctx,
        store,
        form: ProductForm {
            stock: "0".to_string(),
            ..ProductForm::default()
        },
        error: None,
    })
}

/// Handle new product form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireVendor(user): RequireVendor,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let store = owned_store(&state, id, user.id).await?;

    let input = match form.parse() {
        Ok(input) => input,
        Err(error) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                ProductFormTemplate {
                    ctx,
                    store,
                    form,
                    error: Some(error),
                },
            )
                .into_response());
        }
    };

    let product = ProductRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    tracing::info!(product_id = %product.id, store_id = %store.id, "Product created");

    Ok(Redirect::to(&format!("/store/{}/products", store.id)).into_response())
}

// =============================================================================
// Sales
// =============================================================================

/// Display order items that sold the vendor's products.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn vendor_orders(
    State(state): State<AppState>,
    RequireVendor(user): RequireVendor,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let lines = OrderRepository::new(state.pool())
        .list_for_vendor(user.id)
        .await?;

    Ok(VendorOrdersTemplate { ctx, lines })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(price: &str, stock: &str) -> ProductForm {
        ProductForm {
            name: "Mug".to_string(),
            description: String::new(),
            price: price.to_string(),
            stock: stock.to_string(),
            image: String::new(),
        }
    }

    #[test]
    fn test_product_form_parses_numbers() {
        let product = form("4.50", " 7 ").parse();
        assert!(matches!(product, Ok(ref p) if p.stock == 7));
    }

    #[test]
    fn test_product_form_reports_bad_stock() {
        assert_eq!(
            form("4.50", "lots").parse(),
            Err("stock: must be a whole number".to_string())
        );
        assert_eq!(
            form("4.50", "-2").parse(),
            Err("stock: must be zero or more".to_string())
        );
    }
}
