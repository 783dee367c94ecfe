//! Order repository.
//!
//! Read queries run against the pool. The write path is a set of free
//! functions over a `&mut PgConnection` so the checkout service can run them
//! inside one transaction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bazaar_core::{OrderId, OrderItemId, Price, ProductId, StockedProduct, StoreId, UserId};

use super::{RepositoryError, from_count, to_count};
use crate::models::{OrderItem, OrderLine, OrderSummary, VendorOrderLine};

fn decode_price(context: &str, value: Decimal) -> Result<Price, RepositoryError> {
    Price::new(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid price for {context}: {e}")))
}

/// Internal row type for the buyer's order history.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: i32,
    created_at: DateTime<Utc>,
    product_id: i32,
    product_name: String,
    quantity: i32,
    price: Decimal,
}

/// Internal row type for the vendor's sales.
#[derive(Debug, sqlx::FromRow)]
struct VendorOrderRow {
    order_id: i32,
    ordered_at: DateTime<Utc>,
    buyer: String,
    store_id: i32,
    store_name: String,
    product_id: i32,
    product_name: String,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<VendorOrderRow> for VendorOrderLine {
    type Error = RepositoryError;

    fn try_from(row: VendorOrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: OrderId::new(row.order_id),
            ordered_at: row.ordered_at,
            buyer: row.buyer,
            store_id: StoreId::new(row.store_id),
            store_name: row.store_name,
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: to_count("quantity", row.quantity)?,
            unit_price: decode_price("order item", row.price)?,
        })
    }
}

/// Internal row type for locked products.
#[derive(Debug, sqlx::FromRow)]
struct LockedProductRow {
    id: i32,
    name: String,
    price: Decimal,
    stock: i32,
}

impl TryFrom<LockedProductRow> for StockedProduct {
    type Error = RepositoryError;

    fn try_from(row: LockedProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            price: decode_price(&format!("product {}", row.id), row.price)?,
            stock: to_count("stock", row.stock)?,
            name: row.name,
        })
    }
}

/// Internal row type for inserted order items.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: to_count("quantity", row.quantity)?,
            price: decode_price("order item", row.price)?,
        })
    }
}

/// Group flat order lines (sorted newest order first) into summaries.
fn group_orders(rows: Vec<OrderLineRow>) -> Result<Vec<OrderSummary>, RepositoryError> {
    let mut orders: Vec<OrderSummary> = Vec::new();
    let mut index: BTreeMap<i32, usize> = BTreeMap::new();

    for row in rows {
        let line = OrderLine {
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: to_count("quantity", row.quantity)?,
            unit_price: decode_price("order item", row.price)?,
        };
        let slot = *index.entry(row.order_id).or_insert_with(|| {
            orders.push(OrderSummary {
                id: OrderId::new(row.order_id),
                created_at: row.created_at,
                lines: Vec::new(),
            });
            orders.len() - 1
        });
        orders[slot].lines.push(line);
    }

    Ok(orders)
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The buyer's orders, newest first, each with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT o.id AS order_id, o.created_at, oi.product_id,
                   p.name AS product_name, oi.quantity, oi.price
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            JOIN products p ON p.id = oi.product_id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC, oi.id
            ",
        )
        .bind(user.as_i32())
        .fetch_all(self.pool)
        .await?;

        group_orders(rows)
    }

    /// Every order item that sold a product from one of the vendor's stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_vendor(
        &self,
        vendor: UserId,
    ) -> Result<Vec<VendorOrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, VendorOrderRow>(
            r"
            SELECT o.id AS order_id, o.created_at AS ordered_at, u.username AS buyer,
                   s.id AS store_id, s.name AS store_name,
                   p.id AS product_id, p.name AS product_name,
                   oi.quantity, oi.price
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN users u ON u.id = o.user_id
            JOIN products p ON p.id = oi.product_id
            JOIN stores s ON s.id = p.store_id
            WHERE s.owner_id = $1
            ORDER BY o.created_at DESC, oi.id
            ",
        )
        .bind(vendor.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(VendorOrderLine::try_from).collect()
    }

    /// Whether the user has an order item for the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_purchased(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let purchased: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM order_items oi
                JOIN orders o ON o.id = oi.order_id
                WHERE o.user_id = $1 AND oi.product_id = $2
            )
            ",
        )
        .bind(user.as_i32())
        .bind(product.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(purchased)
    }
}

/// Lock the given products for update, in ID order.
///
/// Locking in a fixed order keeps concurrent checkouts from deadlocking.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<StockedProduct>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

    let rows = sqlx::query_as::<_, LockedProductRow>(
        r"
        SELECT id, name, price, stock
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(StockedProduct::try_from).collect()
}

/// Insert an empty order for the user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user: UserId,
) -> Result<(OrderId, DateTime<Utc>), RepositoryError> {
    let (id, created_at): (i32, DateTime<Utc>) =
        sqlx::query_as("INSERT INTO orders (user_id) VALUES ($1) RETURNING id, created_at")
            .bind(user.as_i32())
            .fetch_one(&mut *conn)
            .await?;

    Ok((OrderId::new(id), created_at))
}

/// Insert one order item with its captured unit price.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    order: OrderId,
    product: ProductId,
    quantity: u32,
    price: Price,
) -> Result<OrderItem, RepositoryError> {
    let row = sqlx::query_as::<_, OrderItemRow>(
        r"
        INSERT INTO order_items (order_id, product_id, quantity, price)
        VALUES ($1, $2, $3, $4)
        RETURNING id, order_id, product_id, quantity, price
        ",
    )
    .bind(order.as_i32())
    .bind(product.as_i32())
    .bind(from_count("quantity", quantity)?)
    .bind(price.amount())
    .fetch_one(&mut *conn)
    .await?;

    OrderItem::try_from(row)
}

/// Overwrite a product's stock level.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product no longer exists.
pub async fn set_stock(
    conn: &mut PgConnection,
    product: ProductId,
    stock: u32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
        .bind(product.as_i32())
        .bind(from_count("stock", stock)?)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
