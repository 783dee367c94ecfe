//! `/api/stores` handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::StoreId;

use super::{attach_products, with_reviews};
use crate::db::{ProductRepository, ReviewRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireVendor};
use crate::models::{NewStore, Store, StoreWithProducts};
use crate::state::AppState;

/// Body for creating or renaming a store.
#[derive(Debug, Deserialize)]
pub struct StoreBody {
    pub name: String,
}

/// All stores with their products.
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StoreWithProducts>>> {
    let stores = StoreRepository::new(state.pool()).list_all().await?;
    let products = ProductRepository::new(state.pool()).list_all().await?;
    let products = with_reviews(&ReviewRepository::new(state.pool()), products).await?;

    Ok(Json(attach_products(stores, products)))
}

/// One store with its products.
#[instrument(skip_all, fields(store_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
) -> Result<Json<StoreWithProducts>> {
    let store = StoreRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {id}")))?;
    let products = ProductRepository::new(state.pool())
        .list_by_store(id)
        .await?;
    let products = with_reviews(&ReviewRepository::new(state.pool()), products).await?;

    Ok(Json(StoreWithProducts { store, products }))
}

/// Create a store owned by the calling vendor.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireVendor(user): RequireVendor,
    State(state): State<AppState>,
    Json(body): Json<StoreBody>,
) -> Result<(StatusCode, Json<Store>)> {
    let input = NewStore::parse(&body.name)?;
    let store = StoreRepository::new(state.pool())
        .create(user.id, &input)
        .await?;

    tracing::info!(store_id = %store.id, "Store created via API");
    Ok((StatusCode::CREATED, Json(store)))
}

/// Rename a store the caller owns.
#[instrument(skip_all, fields(user_id = %user.id, store_id = %id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    Json(body): Json<StoreBody>,
) -> Result<Json<Store>> {
    let input = NewStore::parse(&body.name)?;
    let store = StoreRepository::new(state.pool())
        .update(id, user.id, &input)
        .await?;

    Ok(Json(store))
}

/// Delete a store the caller owns.
#[instrument(skip_all, fields(user_id = %user.id, store_id = %id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
) -> Result<StatusCode> {
    StoreRepository::new(state.pool()).delete(id, user.id).await?;

    tracing::info!("Store deleted via API");
    Ok(StatusCode::NO_CONTENT)
}
