//! Review submission.
//!
//! A review is marked as a verified purchase when the author already has an
//! order item for the product. The flag is computed once, here, and never
//! recomputed on edit.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{ProductId, ReviewDraft, ReviewError, UserId};

use crate::db::{OrderRepository, ProductRepository, RepositoryError, ReviewRepository};
use crate::models::Review;

/// Errors from submitting a review.
#[derive(Debug, Error)]
pub enum ReviewFailure {
    /// Rating or comment rejected.
    #[error(transparent)]
    Invalid(#[from] ReviewError),

    /// The product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// Database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Review service.
pub struct ReviewService<'a> {
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            reviews: ReviewRepository::new(pool),
        }
    }

    /// Validate and store a review by `user` for `product`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewFailure::ProductNotFound` if the product is missing,
    /// `ReviewFailure::Invalid` for an out-of-range rating or empty comment.
    #[instrument(skip(self, comment))]
    pub async fn submit(
        &self,
        user: UserId,
        product: ProductId,
        rating: i64,
        comment: &str,
    ) -> Result<Review, ReviewFailure> {
        if self.products.get(product).await?.is_none() {
            return Err(ReviewFailure::ProductNotFound);
        }

        let draft = ReviewDraft::new(rating, comment)?;
        let purchased = self.orders.has_purchased(user, product).await?;
        let review = self
            .reviews
            .create(&draft.into_review(user, product, purchased))
            .await?;

        tracing::info!(
            review_id = %review.id,
            verified_purchase = review.verified_purchase,
            "Review submitted"
        );
        Ok(review)
    }
}
