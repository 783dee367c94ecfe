//! Database operations for the marketplace `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts with their role (`user_role` enum)
//! - `stores` - Vendor-owned stores
//! - `products` - Products listed in a store
//! - `orders` / `order_items` - Completed checkouts with captured prices
//! - `reviews` - Product reviews with the verified-purchase flag
//! - `tower_sessions.session` - Tower-sessions storage (session cart lives here)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` into private row types,
//! then converted into the domain models in [`crate::models`]. Conversions
//! are fallible: a row that violates a domain invariant surfaces as
//! [`RepositoryError::DataCorruption`].

pub mod orders;
pub mod products;
pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Decode a non-negative `INTEGER` column into a count.
pub(crate) fn to_count(column: &str, value: i32) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Encode a count for an `INTEGER` column.
pub(crate) fn from_count(column: &str, value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{column} out of range: {value}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_count_rejects_negative() {
        assert_eq!(to_count("stock", 4).ok(), Some(4));
        assert!(matches!(
            to_count("stock", -1),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_from_count_rejects_overflow() {
        assert_eq!(from_count("stock", 7).ok(), Some(7));
        assert!(from_count("stock", u32::MAX).is_err());
    }

    #[test]
    fn test_non_unique_errors_stay_database_errors() {
        let err = RepositoryError::from_unique_violation(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
