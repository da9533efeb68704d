//! # Store Seams
//!
//! The accessors the engine talks to, as traits, so the same engine runs
//! against SQLite in production and [`MemoryStore`](crate::memory::MemoryStore)
//! in tests.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CheckoutStore ─┬─ CustomerAccessor   customer_exists(id)              │
//! │                 ├─ InventoryAccessor  find_by_id / find_by_ids         │
//! │                 ├─ OrderStore         find_many / find_order           │
//! │                 └─ begin() ──► Box<dyn UnitOfWork>                     │
//! │                                  ├─ create_header                      │
//! │                                  ├─ insert_lines                       │
//! │                                  ├─ decrement                          │
//! │                                  └─ commit | rollback | drop (= abort) │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a unit of work without committing discards every write made
//! through it. Cancellation and timeouts rely on that.

use async_trait::async_trait;
use till_core::{Money, Order, OrderFilter, PricedLine, Product};
use till_db::{DbResult, OrderHeader};

/// Customer existence checks.
#[async_trait]
pub trait CustomerAccessor: Send + Sync {
    async fn customer_exists(&self, id: &str) -> DbResult<bool>;
}

/// Product reads.
#[async_trait]
pub trait InventoryAccessor: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DbResult<Option<Product>>;

    /// Products whose ids are in `ids`. Unknown ids are omitted.
    async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>>;
}

/// Committed order reads.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_many(&self, filter: &OrderFilter) -> DbResult<Vec<Order>>;

    async fn find_order(&self, id: &str) -> DbResult<Option<Order>>;
}

/// One atomic set of checkout writes.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Writes the order header; the store assigns id and creation time.
    async fn create_header(
        &mut self,
        customer_id: &str,
        paid: Money,
        change: Money,
    ) -> DbResult<OrderHeader>;

    /// Writes all lines of the order, keeping their order.
    async fn insert_lines(&mut self, order_id: &str, lines: &[PricedLine]) -> DbResult<()>;

    /// Guarded decrement: fails instead of taking stock below zero.
    async fn decrement(&mut self, product_id: &str, quantity: i64) -> DbResult<()>;

    async fn commit(self: Box<Self>) -> DbResult<()>;

    async fn rollback(self: Box<Self>) -> DbResult<()>;
}

/// Everything the checkout engine needs from a backing store.
#[async_trait]
pub trait CheckoutStore: CustomerAccessor + InventoryAccessor + OrderStore {
    async fn begin(&self) -> DbResult<Box<dyn UnitOfWork>>;
}
