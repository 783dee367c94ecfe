//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use bazaar_core::ProductId;

use super::PageContext;
use crate::db::{ProductRepository, ReviewRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::{Product, Review, Store};
use crate::state::AppState;

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<Product>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: Product,
    pub store: Option<Store>,
    pub reviews: Vec<Review>,
}

impl ProductShowTemplate {
    /// Mean rating to one decimal, if there are reviews.
    #[must_use]
    pub fn average_rating(&self) -> Option<String> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating.get())).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = f64::from(sum) / self.reviews.len() as f64;
        Some(format!("{mean:.1}"))
    }
}

/// Display all products.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool()).list_all().await?;

    Ok(ProductsIndexTemplate { ctx, products })
}

/// Display product detail page with its reviews.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let store = StoreRepository::new(state.pool())
        .get(product.store_id)
        .await?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(ProductShowTemplate {
        ctx,
        product,
        store,
        reviews,
    })
}
