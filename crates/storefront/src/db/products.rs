//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{Price, ProductId, StoreId, UserId};

use super::{RepositoryError, from_count, to_count};
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str =
    "p.id, p.store_id, p.name, p.description, p.price, p.stock, p.image, p.created_at";

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    store_id: i32,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: row.name,
            description: row.description,
            price,
            stock: to_count("stock", row.stock)?,
            image: row.image,
            created_at: row.created_at,
        })
    }
}

fn collect(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to a store.
    ///
    /// The caller is responsible for checking store ownership first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store: StoreId,
        input: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (store_id, name, description, price, stock, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, store_id, name, description, price, stock, image, created_at
            ",
        )
        .bind(store.as_i32())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.amount())
        .bind(from_count("stock", input.stock)?)
        .bind(input.image.as_deref())
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// List every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.created_at DESC, p.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        collect(rows)
    }

    /// List the products of one store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE p.store_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .bind(store.as_i32())
        .fetch_all(self.pool)
        .await?;

        collect(rows)
    }

    /// Fetch the given products, in ID order. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1) ORDER BY p.id"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        collect(rows)
    }

    /// Replace the fields of a product whose store `owner` owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or
    /// belongs to another vendor.
    pub async fn update(
        &self,
        id: ProductId,
        owner: UserId,
        input: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products p
            SET name = $3, description = $4, price = $5, stock = $6, image = $7
            FROM stores s
            WHERE p.id = $1 AND p.store_id = s.id AND s.owner_id = $2
            RETURNING p.id, p.store_id, p.name, p.description, p.price, p.stock, p.image,
                p.created_at
            ",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.amount())
        .bind(from_count("stock", input.stock)?)
        .bind(input.image.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product whose store `owner` owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or
    /// belongs to another vendor.
    pub async fn delete(&self, id: ProductId, owner: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM products p
            USING stores s
            WHERE p.id = $1 AND p.store_id = s.id AND s.owner_id = $2
            ",
        )
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
