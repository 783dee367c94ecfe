//! `/api/products` handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{ProductId, StoreId};

use super::with_reviews;
use crate::db::{ProductRepository, ReviewRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{NewProduct, Product, ProductWithReviews};
use crate::state::AppState;

/// A price as either a JSON string (`"9.99"`) or number (`9.99`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(serde_json::Number),
}

impl PriceInput {
    fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Body for creating a product. `store` is ignored on update.
#[derive(Debug, Deserialize)]
pub struct ProductBody {
    #[serde(default)]
    pub store: Option<StoreId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: PriceInput,
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductBody {
    fn parse(&self) -> Result<NewProduct> {
        Ok(NewProduct::parse(
            &self.name,
            self.description.as_deref(),
            &self.price.as_text(),
            self.stock,
            self.image.as_deref(),
        )?)
    }
}

/// All products with their reviews.
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductWithReviews>>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    let products = with_reviews(&ReviewRepository::new(state.pool()), products).await?;

    Ok(Json(products))
}

/// One product with its reviews.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductWithReviews>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(Json(ProductWithReviews { product, reviews }))
}

/// Add a product to a store the caller owns.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<Product>)> {
    let store_id = body
        .store
        .ok_or_else(|| AppError::BadRequest("store is required".to_string()))?;
    let input = body.parse()?;

    let store = StoreRepository::new(state.pool())
        .get_owned(store_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {store_id}")))?;
    let product = ProductRepository::new(state.pool())
        .create(store.id, &input)
        .await?;

    tracing::info!(product_id = %product.id, store_id = %store.id, "Product created via API");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product in a store the caller owns.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductBody>,
) -> Result<Json<Product>> {
    let input = body.parse()?;
    let product = ProductRepository::new(state.pool())
        .update(id, user.id, &input)
        .await?;

    Ok(Json(product))
}

/// Delete a product in a store the caller owns.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id, user.id).await?;

    tracing::info!("Product deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::Price;

    use super::*;

    #[test]
    fn test_price_accepts_string_or_number() {
        let body: ProductBody = serde_json::from_str(
            r#"{"store": 3, "name": "Mug", "price": "12.50", "stock": 4}"#,
        )
        .unwrap();
        assert_eq!(body.store, Some(StoreId::new(3)));
        assert_eq!(body.parse().unwrap().price, Price::from_cents(1250));

        let body: ProductBody =
            serde_json::from_str(r#"{"name": "Mug", "price": 9.99, "stock": 0}"#).unwrap();
        assert_eq!(body.parse().unwrap().price, Price::from_cents(999));
    }

    #[test]
    fn test_negative_stock_is_a_validation_error() {
        let body: ProductBody =
            serde_json::from_str(r#"{"name": "Mug", "price": "1", "stock": -2}"#).unwrap();
        assert!(matches!(body.parse(), Err(AppError::Validation(e)) if e.field == "stock"));
    }
}
