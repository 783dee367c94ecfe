//! Review form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{ProductId, Rating};

use super::PageContext;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::services::reviews::{ReviewFailure, ReviewService};
use crate::state::AppState;

/// Review form data.
///
/// The rating arrives as text so a non-numeric value can be shown back
/// with a message instead of a rejection.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: String,
    pub comment: String,
}

/// Review form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/review.html")]
pub struct ReviewTemplate {
    pub ctx: PageContext,
    pub product: Product,
    pub error: Option<String>,
    pub rating: String,
    pub comment: String,
}

impl ReviewTemplate {
    /// Options for the rating select.
    #[must_use]
    pub fn rating_options(&self) -> Vec<u8> {
        (Rating::MIN..=Rating::MAX).rev().collect()
    }
}

async fn load_product(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Display the review form.
#[instrument(skip_all)]
pub async fn review_page(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let product = load_product(&state, ProductId::new(id)).await?;

    Ok(ReviewTemplate {
        ctx,
        product,
        error: None,
        rating: "5".to_string(),
        comment: String::new(),
    })
}

/// Handle review form submission.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let product_id = ProductId::new(id);

    let error = match form.rating.trim().parse::<i64>() {
        Ok(rating) => match ReviewService::new(state.pool())
            .submit(user.id, product_id, rating, &form.comment)
            .await
        {
            Ok(_) => return Ok(Redirect::to(&format!("/product/{product_id}")).into_response()),
            Err(ReviewFailure::Invalid(e)) => e.to_string(),
            Err(other) => return Err(other.into()),
        },
        Err(_) => "rating must be a number".to_string(),
    };

    let product = load_product(&state, product_id).await?;
    Ok((
        StatusCode::BAD_REQUEST,
        ReviewTemplate {
            ctx,
            product,
            error: Some(error),
            rating: form.rating,
            comment: form.comment,
        },
    )
        .into_response())
}
