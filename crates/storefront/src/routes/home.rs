//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::PageContext;
use crate::db::{ProductRepository, StoreRepository};
use crate::error::Result;
use crate::filters;
use crate::models::{Product, Store};
use crate::state::AppState;

/// Number of products shown on the home page.
const HOME_PRODUCT_COUNT: usize = 12;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    /// Newest products across all stores.
    pub products: Vec<Product>,
    pub stores: Vec<Store>,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let mut products = ProductRepository::new(state.pool()).list_all().await?;
    products.truncate(HOME_PRODUCT_COUNT);
    let stores = StoreRepository::new(state.pool()).list_all().await?;

    Ok(HomeTemplate {
        ctx,
        products,
        stores,
    })
}
