//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  Inside the checkout transaction (caller's connection):                │
//! │     create_header() → OrderHeader { id, created_at }                   │
//! │     insert_lines()  → one row per line, position = request order       │
//! │                                                                         │
//! │  After commit (pool):                                                  │
//! │     find_many(filter) → page of orders, each with its items            │
//! │     get_by_id(id)     → one order                                      │
//! │                                                                         │
//! │  There is no update or delete. The schema enforces it.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{now, timestamp};
use crate::error::DbResult;
use till_core::{LineItem, Order, OrderFilter, OrderId, PricedLine};

/// Identity assigned to a new order by [`OrderRepository::create_header`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHeader {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer_id: String,
    paid_cents: i64,
    change_cents: i64,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Order {
        Order {
            id: self.id,
            customer_id: self.customer_id,
            paid_cents: self.paid_cents,
            change_cents: self.change_cents,
            created_at: self.created_at,
            items,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order header on the caller's connection.
    ///
    /// The id is a fresh UUID and `created_at` is the current time; both are
    /// returned so the caller can report them after commit.
    pub async fn create_header(
        conn: &mut SqliteConnection,
        customer_id: &str,
        paid_cents: i64,
        change_cents: i64,
    ) -> DbResult<OrderHeader> {
        let header = OrderHeader {
            id: Uuid::new_v4().to_string(),
            created_at: now(),
        };

        debug!(id = %header.id, customer_id = %customer_id, "Creating order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, paid_cents, change_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&header.id)
        .bind(customer_id)
        .bind(paid_cents)
        .bind(change_cents)
        .bind(timestamp(header.created_at))
        .execute(&mut *conn)
        .await?;

        Ok(header)
    }

    /// Inserts all lines of an order in one statement, keeping their order.
    pub async fn insert_lines(
        conn: &mut SqliteConnection,
        order_id: &str,
        lines: &[PricedLine],
    ) -> DbResult<()> {
        if lines.is_empty() {
            return Ok(());
        }

        debug!(order_id = %order_id, count = lines.len(), "Inserting order lines");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO order_items (order_id, position, product_id, quantity, unit_price_cents, line_total_cents) ",
        );
        query.push_values(lines.iter().enumerate(), |mut row, (position, line)| {
            row.push_bind(order_id)
                .push_bind(position as i64)
                .push_bind(&line.product_id)
                .push_bind(line.quantity)
                .push_bind(line.unit_price_cents)
                .push_bind(line.line_total_cents);
        });

        query.build().execute(&mut *conn).await?;
        Ok(())
    }

    /// Lists orders matching `filter`, each with its line items.
    ///
    /// Ordered by creation time in the filter's direction. Orders created in
    /// the same instant keep insertion order (ties broken by rowid).
    pub async fn find_many(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        debug!(
            customer_id = ?filter.customer_id,
            sort = filter.sort.as_sql(),
            limit = filter.limit,
            offset = filter.offset,
            "Listing orders"
        );

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, customer_id, paid_cents, change_cents, created_at FROM orders",
        );
        if let Some(customer_id) = &filter.customer_id {
            query.push(" WHERE customer_id = ").push_bind(customer_id);
        }
        let direction = filter.sort.as_sql();
        query
            .push(format!(" ORDER BY created_at {direction}, rowid {direction}"))
            .push(" LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset));

        let headers: Vec<OrderRow> = query.build_query_as().fetch_all(&self.pool).await?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = headers.iter().map(|h| h.id.as_str()).collect();
        let mut items = self.items_for(&ids).await?;

        let orders = headers
            .into_iter()
            .map(|header| {
                let lines = items.remove(header.id.as_str()).unwrap_or_default();
                header.into_order(lines)
            })
            .collect::<Vec<_>>();

        debug!(count = orders.len(), "Order listing returned");
        Ok(orders)
    }

    /// Gets one order with its line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let header: Option<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id, paid_cents, change_cents, created_at FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let mut items = self.items_for(&[id]).await?;
        let lines = items.remove(id).unwrap_or_default();
        Ok(Some(header.into_order(lines)))
    }

    /// Counts orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts line items across all orders (for diagnostics).
    pub async fn count_items(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Line items of the given orders, grouped by order id, in line order.
    async fn items_for(&self, order_ids: &[&str]) -> DbResult<HashMap<String, Vec<LineItem>>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT order_id, product_id, quantity, unit_price_cents, line_total_cents FROM order_items WHERE order_id IN (",
        );
        let mut separated = query.separated(", ");
        for id in order_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY order_id, position");

        let rows: Vec<LineItem> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut grouped: HashMap<String, Vec<LineItem>> = HashMap::with_capacity(order_ids.len());
        for item in rows {
            grouped.entry(item.order_id.clone()).or_default().push(item);
        }
        Ok(grouped)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use till_core::{Customer, Product, SortDirection};

    fn line(product_id: &str, quantity: i64, unit: i64) -> PricedLine {
        PricedLine {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents: unit,
            line_total_cents: unit * quantity,
        }
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (id, phone) in [("C1", "555-0001"), ("C2", "555-0002")] {
            db.customers()
                .insert(&Customer {
                    id: id.to_string(),
                    name: id.to_string(),
                    phone_number: phone.to_string(),
                    created_at: now(),
                })
                .await
                .unwrap();
        }
        for id in ["P1", "P2"] {
            let at = now();
            db.products()
                .insert(&Product {
                    id: id.to_string(),
                    sku: format!("SKU-{id}"),
                    name: id.to_string(),
                    price_cents: 100,
                    stock: 100,
                    is_available: true,
                    created_at: at,
                    updated_at: at,
                })
                .await
                .unwrap();
        }
        db
    }

    async fn place(db: &Database, customer_id: &str, lines: &[PricedLine]) -> OrderHeader {
        let total: i64 = lines.iter().map(|l| l.line_total_cents).sum();
        let mut tx = db.begin().await.unwrap();
        let header = OrderRepository::create_header(&mut tx, customer_id, total, 0)
            .await
            .unwrap();
        OrderRepository::insert_lines(&mut tx, &header.id, lines)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        header
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = seeded().await;
        let header = place(&db, "C1", &[line("P2", 3, 100), line("P1", 1, 100)]).await;

        let order = db.orders().get_by_id(&header.id).await.unwrap().unwrap();
        assert_eq!(order.customer_id, "C1");
        assert_eq!(order.paid_cents, 400);
        assert_eq!(order.created_at, header.created_at);
        assert_eq!(order.items.len(), 2);
        // Lines come back in insertion order, not product id order.
        assert_eq!(order.items[0].product_id, "P2");
        assert_eq!(order.items[1].product_id, "P1");
        assert!(order.items.iter().all(|i| i.order_id == header.id));

        assert!(db.orders().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_uncommitted_order_is_invisible() {
        let db = seeded().await;

        {
            let mut tx = db.begin().await.unwrap();
            let header = OrderRepository::create_header(&mut tx, "C1", 100, 0)
                .await
                .unwrap();
            OrderRepository::insert_lines(&mut tx, &header.id, &[line("P1", 1, 100)])
                .await
                .unwrap();
            tx.rollback().await.unwrap();
        }

        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert_eq!(db.orders().count_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_violates_foreign_key() {
        let db = seeded().await;
        let mut tx = db.begin().await.unwrap();

        let err = OrderRepository::create_header(&mut tx, "ghost", 100, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_find_many_sort_and_paging() {
        let db = seeded().await;
        let mut ids = Vec::new();
        for _ in 0..7 {
            ids.push(place(&db, "C1", &[line("P1", 1, 100)]).await.id);
        }

        // Default: newest first, five per page.
        let page = db.orders().find_many(&OrderFilter::default()).await.unwrap();
        let got: Vec<&str> = page.iter().map(|o| o.id.as_str()).collect();
        let expected: Vec<&str> = ids.iter().rev().take(5).map(String::as_str).collect();
        assert_eq!(got, expected);

        let filter = OrderFilter {
            sort: SortDirection::Ascending,
            limit: 3,
            offset: 5,
            ..Default::default()
        };
        let page = db.orders().find_many(&filter).await.unwrap();
        let got: Vec<&str> = page.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(got, vec![ids[5].as_str(), ids[6].as_str()]);

        let filter = OrderFilter {
            offset: 100,
            ..Default::default()
        };
        assert!(db.orders().find_many(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_many_by_customer() {
        let db = seeded().await;
        place(&db, "C1", &[line("P1", 1, 100)]).await;
        let c2 = place(&db, "C2", &[line("P1", 2, 100), line("P2", 1, 100)]).await;
        place(&db, "C1", &[line("P2", 1, 100)]).await;

        let filter = OrderFilter {
            customer_id: Some("C2".to_string()),
            ..Default::default()
        };
        let orders = db.orders().find_many(&filter).await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, c2.id);
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[0].total().cents(), 300);
    }

    #[tokio::test]
    async fn test_orders_are_append_only() {
        let db = seeded().await;
        let header = place(&db, "C1", &[line("P1", 1, 100)]).await;

        let update = sqlx::query("UPDATE orders SET paid_cents = 1 WHERE id = ?1")
            .bind(&header.id)
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(&header.id)
            .execute(db.pool())
            .await;
        assert!(delete.is_err());

        assert_eq!(db.orders().count_items().await.unwrap(), 1);
    }
}
