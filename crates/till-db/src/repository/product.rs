//! # Product Repository
//!
//! Inventory access for checkout: batch lookup and the guarded decrement.
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Conditional Stock Decrement                          │
//! │                                                                         │
//! │  ❌ Read-modify-write (two checkouts both see stock = 3)               │
//! │     SELECT stock ...; UPDATE products SET stock = 1 ...                │
//! │                                                                         │
//! │  ✅ Guarded delta, one statement                                       │
//! │     UPDATE products SET stock = stock - ?1                             │
//! │     WHERE id = ?3 AND stock >= ?1                                      │
//! │                                                                         │
//! │  0 rows affected → DbError::StockExhausted, transaction rolls back     │
//! │  CHECK (stock >= 0) backs this up at the schema level                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{now, timestamp};
use crate::error::{DbError, DbResult};
use till_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, sku, name, price_cents, stock, is_available, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let found = repo.find_by_ids(&["P1".to_string(), "P2".to_string()]).await?;
/// let product = repo.get_by_id("P1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Fetches every product whose id is in `ids`, in one query.
    ///
    /// Ids that match nothing are simply absent from the result; callers
    /// detect them by comparing counts. Result order is unspecified.
    pub async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Looking up products");

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(found = products.len(), "Product lookup returned");
        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id or SKU already exists
    /// * `Err(DbError::CheckViolation)` - negative price or stock
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, price_cents, stock, is_available,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_available)
        .bind(timestamp(product.created_at))
        .bind(timestamp(product.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Decrements stock by `quantity` only if at least that much is on hand.
    ///
    /// Runs on the caller's connection so it joins the caller's transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::StockExhausted)` - no row matched (stock too low or id unknown)
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(product_id = %product_id, quantity, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?1, updated_at = ?2
            WHERE id = ?3 AND stock >= ?1
            "#,
        )
        .bind(quantity)
        .bind(timestamp(now()))
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::StockExhausted {
                product_id: product_id.to_string(),
                quantity,
            });
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
