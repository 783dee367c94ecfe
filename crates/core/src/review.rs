//! Review input rules.

use crate::types::{ProductId, Rating, RatingError, UserId};

/// Errors from review form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error(transparent)]
    Rating(#[from] RatingError),

    #[error("comment cannot be empty")]
    EmptyComment,

    #[error("comment must be at most {max} characters")]
    CommentTooLong { max: usize },
}

/// Validated review input, not yet tied to a user or product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: Rating,
    pub comment: String,
}

impl ReviewDraft {
    pub const MAX_COMMENT_LENGTH: usize = 5000;

    /// Validate submitted rating and comment. The comment is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError`] if the rating is outside 1..=5 or the comment
    /// is blank or too long.
    pub fn new(rating: i64, comment: &str) -> Result<Self, ReviewError> {
        let rating = Rating::new(rating)?;
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        if comment.chars().count() > Self::MAX_COMMENT_LENGTH {
            return Err(ReviewError::CommentTooLong {
                max: Self::MAX_COMMENT_LENGTH,
            });
        }
        Ok(Self {
            rating,
            comment: comment.to_string(),
        })
    }

    /// Attach the author and product.
    ///
    /// `has_purchased` is whether the author has any order item for the
    /// product right now. It is frozen into the review and never recomputed.
    #[must_use]
    pub fn into_review(
        self,
        user_id: UserId,
        product_id: ProductId,
        has_purchased: bool,
    ) -> NewReview {
        NewReview {
            product_id,
            user_id,
            rating: self.rating,
            comment: self.comment,
            verified_purchase: has_purchased,
        }
    }
}

/// A review ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub comment: String,
    pub verified_purchase: bool,
}
