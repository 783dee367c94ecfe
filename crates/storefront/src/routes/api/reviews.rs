//! `/api/reviews` handlers.
//!
//! The verified-purchase flag is set when a review is created and kept as-is
//! on edit.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{ProductId, ReviewDraft, ReviewId};

use crate::db::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Review;
use crate::services::reviews::ReviewService;
use crate::state::AppState;

/// Body for creating a review.
#[derive(Debug, Deserialize)]
pub struct NewReviewBody {
    pub product: ProductId,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

/// Body for editing a review.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

/// All reviews, newest first.
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Review>>> {
    Ok(Json(ReviewRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip_all, fields(review_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>> {
    ReviewRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Review {id}")))
}

/// Review a product as the caller.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<NewReviewBody>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state.pool())
        .submit(user.id, body.product, body.rating, &body.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Edit the caller's own review.
#[instrument(skip_all, fields(user_id = %user.id, review_id = %id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<Review>> {
    let draft = ReviewDraft::new(body.rating, &body.comment)?;
    let review = ReviewRepository::new(state.pool())
        .update(id, user.id, &draft)
        .await?;

    Ok(Json(review))
}

/// Delete the caller's own review.
#[instrument(skip_all, fields(user_id = %user.id, review_id = %id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    ReviewRepository::new(state.pool()).delete(id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
