//! Store repository.
//!
//! Mutating queries are scoped by owner: a store that exists but belongs to
//! someone else behaves exactly like a missing one.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{StoreId, UserId};

use super::RepositoryError;
use crate::models::{NewStore, Store};

/// Internal row type for store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    owner_id: i32,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a store owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, owner: UserId, input: &NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO stores (owner_id, name)
            VALUES ($1, $2)
            RETURNING id, owner_id, name, created_at
            ",
        )
        .bind(owner.as_i32())
        .bind(&input.name)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            "SELECT id, owner_id, name, created_at FROM stores WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a store only if `owner` owns it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: StoreId,
        owner: UserId,
    ) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, owner_id, name, created_at
            FROM stores
            WHERE id = $1 AND owner_id = $2
            ",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List every store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            "SELECT id, owner_id, name, created_at FROM stores ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List the stores owned by a vendor, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, owner_id, name, created_at
            FROM stores
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(owner.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Rename a store the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such store is owned by `owner`.
    pub async fn update(
        &self,
        id: StoreId,
        owner: UserId,
        input: &NewStore,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            UPDATE stores
            SET name = $3
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, created_at
            ",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .bind(&input.name)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a store the caller owns (cascades to its products).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such store is owned by `owner`.
    pub async fn delete(&self, id: StoreId, owner: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1 AND owner_id = $2")
            .bind(id.as_i32())
            .bind(owner.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
