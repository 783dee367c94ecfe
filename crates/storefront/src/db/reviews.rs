//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{NewReview, ProductId, Rating, ReviewDraft, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

/// Internal row type for review queries (joined with the author's username).
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    username: String,
    rating: i16,
    comment: String,
    verified_purchase: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating))
            .map_err(|e| RepositoryError::DataCorruption(format!("review {}: {e}", row.id)))?;

        Ok(Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            username: row.username,
            rating,
            comment: row.comment,
            verified_purchase: row.verified_purchase,
            created_at: row.created_at,
        })
    }
}

fn collect(rows: Vec<ReviewRow>) -> Result<Vec<Review>, RepositoryError> {
    rows.into_iter().map(Review::try_from).collect()
}

const SELECT_REVIEW: &str = r"
    SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.comment,
           r.verified_purchase, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id
";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            WITH inserted AS (
                INSERT INTO reviews (product_id, user_id, rating, comment, verified_purchase)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, product_id, user_id, rating, comment, verified_purchase, created_at
            )
            SELECT i.id, i.product_id, i.user_id, u.username, i.rating, i.comment,
                   i.verified_purchase, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            ",
        )
        .bind(review.product_id.as_i32())
        .bind(review.user_id.as_i32())
        .bind(review.rating.as_i16())
        .bind(&review.comment)
        .bind(review.verified_purchase)
        .fetch_one(self.pool)
        .await?;

        Review::try_from(row)
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(Review::try_from).transpose()
    }

    /// List every review, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{SELECT_REVIEW} ORDER BY r.created_at DESC, r.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        collect(rows)
    }

    /// List the reviews of one product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{SELECT_REVIEW} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(product.as_i32())
        .fetch_all(self.pool)
        .await?;

        collect(rows)
    }

    /// List the reviews of several products at once, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_products(
        &self,
        products: &[ProductId],
    ) -> Result<Vec<Review>, RepositoryError> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = products.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{SELECT_REVIEW} WHERE r.product_id = ANY($1) ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        collect(rows)
    }

    /// Edit the rating and comment of the author's own review.
    ///
    /// The verified-purchase flag is left as computed at creation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review was written by `author`.
    pub async fn update(
        &self,
        id: ReviewId,
        author: UserId,
        draft: &ReviewDraft,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            WITH updated AS (
                UPDATE reviews
                SET rating = $3, comment = $4
                WHERE id = $1 AND user_id = $2
                RETURNING id, product_id, user_id, rating, comment, verified_purchase, created_at
            )
            SELECT d.id, d.product_id, d.user_id, u.username, d.rating, d.comment,
                   d.verified_purchase, d.created_at
            FROM updated d
            JOIN users u ON u.id = d.user_id
            ",
        )
        .bind(id.as_i32())
        .bind(author.as_i32())
        .bind(draft.rating.as_i16())
        .bind(&draft.comment)
        .fetch_optional(self.pool)
        .await?;

        row.map(Review::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete the author's own review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review was written by `author`.
    pub async fn delete(&self, id: ReviewId, author: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND user_id = $2")
            .bind(id.as_i32())
            .bind(author.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
