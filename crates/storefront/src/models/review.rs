//! Product reviews.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{ProductId, Rating, ReviewId, UserId};

/// A stored review with the author's username.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub username: String,
    pub rating: Rating,
    pub comment: String,
    pub verified_purchase: bool,
    pub created_at: DateTime<Utc>,
}
