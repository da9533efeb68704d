//! # In-Memory Store
//!
//! A [`CheckoutStore`] held entirely in process memory, for tests.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin()                                                                │
//! │    ├── lock state (OwnedMutexGuard, held until commit/rollback/drop)   │
//! │    └── staged = state.clone()                                          │
//! │                                                                         │
//! │  create_header / insert_lines / decrement  → mutate `staged` only      │
//! │                                                                         │
//! │  commit()    → *state = staged                                         │
//! │  rollback()  → staged discarded                                        │
//! │  drop        → staged discarded                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Holding the lock for the whole unit of work serializes checkouts the way
//! SQLite's single writer does.
//!
//! [`FailPoint`] makes one step fail or stall so rollback and timeout paths can
//! be exercised, and lookup counters let tests assert which reads happened.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use till_core::{Customer, Money, Order, OrderFilter, PricedLine, Product, SortDirection};
use till_db::{DbError, DbResult, OrderHeader};

use crate::store::{CheckoutStore, CustomerAccessor, InventoryAccessor, OrderStore, UnitOfWork};

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    CreateHeader,
    InsertLines,
    /// Fails the first decrement.
    Decrement,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    customers: HashSet<String>,
    products: BTreeMap<String, Product>,
    /// Insertion order.
    orders: Vec<Order>,
    fail_at: Option<FailPoint>,
    stall: Option<(FailPoint, Duration)>,
}

#[derive(Debug, Default)]
struct Counters {
    customer_lookups: AtomicUsize,
    product_lookups: AtomicUsize,
    units_begun: AtomicUsize,
}

/// In-memory [`CheckoutStore`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    counters: Arc<Counters>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.state.lock().await.customers.insert(customer.id);
    }

    pub async fn insert_product(&self, product: Product) {
        self.state
            .lock()
            .await
            .products
            .insert(product.id.clone(), product);
    }

    /// Current committed state of a product.
    pub async fn product(&self, id: &str) -> Option<Product> {
        self.state.lock().await.products.get(id).cloned()
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    pub async fn line_count(&self) -> usize {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .map(|o| o.items.len())
            .sum()
    }

    /// Makes the given step fail until cleared with `None`.
    pub async fn fail_at(&self, point: Option<FailPoint>) {
        self.state.lock().await.fail_at = point;
    }

    /// Makes the given step sleep until cleared with `None`.
    ///
    /// Steps stall before doing their work, except `Commit`, which publishes
    /// the staged state first and then stalls while still holding the lock.
    pub async fn stall_at(&self, stall: Option<(FailPoint, Duration)>) {
        self.state.lock().await.stall = stall;
    }

    pub fn customer_lookups(&self) -> usize {
        self.counters.customer_lookups.load(Ordering::SeqCst)
    }

    pub fn product_lookups(&self) -> usize {
        self.counters.product_lookups.load(Ordering::SeqCst)
    }

    pub fn units_begun(&self) -> usize {
        self.counters.units_begun.load(Ordering::SeqCst)
    }
}

fn injected(point: FailPoint) -> DbError {
    DbError::Internal(format!("injected failure at {point:?}"))
}

#[async_trait]
impl CustomerAccessor for MemoryStore {
    async fn customer_exists(&self, id: &str) -> DbResult<bool> {
        self.counters.customer_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().await.customers.contains(id))
    }
}

#[async_trait]
impl InventoryAccessor for MemoryStore {
    async fn find_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.counters.product_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().await.products.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        self.counters.product_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_many(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let state = self.state.lock().await;

        let mut orders: Vec<&Order> = state
            .orders
            .iter()
            .filter(|o| {
                filter
                    .customer_id
                    .as_deref()
                    .map_or(true, |id| o.customer_id == id)
            })
            .collect();

        // Stable sort keeps insertion order for equal timestamps.
        orders.sort_by_key(|o| o.created_at);
        if filter.sort == SortDirection::Descending {
            orders.reverse();
        }

        Ok(orders
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn find_order(&self, id: &str) -> DbResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn begin(&self) -> DbResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        if guard.fail_at == Some(FailPoint::Begin) {
            return Err(injected(FailPoint::Begin));
        }
        pause(guard.stall, FailPoint::Begin).await;

        self.counters.units_begun.fetch_add(1, Ordering::SeqCst);
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

/// Staged writes against a locked [`MemoryStore`].
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryUnitOfWork {
    async fn check(&self, point: FailPoint) -> DbResult<()> {
        if self.guard.fail_at == Some(point) {
            return Err(injected(point));
        }
        pause(self.guard.stall, point).await;
        Ok(())
    }
}

async fn pause(stall: Option<(FailPoint, Duration)>, point: FailPoint) {
    if let Some((at, delay)) = stall {
        if at == point {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn create_header(
        &mut self,
        customer_id: &str,
        paid: Money,
        change: Money,
    ) -> DbResult<OrderHeader> {
        self.check(FailPoint::CreateHeader).await?;

        if !self.staged.customers.contains(customer_id) {
            return Err(DbError::ForeignKeyViolation {
                message: format!("unknown customer {customer_id}"),
            });
        }

        let header = OrderHeader {
            id: format!("order-{}", self.staged.orders.len() + 1),
            created_at: Utc::now(),
        };
        self.staged.orders.push(Order {
            id: header.id.clone(),
            customer_id: customer_id.to_string(),
            paid_cents: paid.cents(),
            change_cents: change.cents(),
            created_at: header.created_at,
            items: Vec::new(),
        });

        Ok(header)
    }

    async fn insert_lines(&mut self, order_id: &str, lines: &[PricedLine]) -> DbResult<()> {
        self.check(FailPoint::InsertLines).await?;

        let order = self
            .staged
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| DbError::ForeignKeyViolation {
                message: format!("unknown order {order_id}"),
            })?;

        for line in lines {
            if order.items.iter().any(|i| i.product_id == line.product_id) {
                return Err(DbError::duplicate("order_items.product_id", &line.product_id));
            }
            order.items.push(line.clone().into_line_item(order_id));
        }

        Ok(())
    }

    async fn decrement(&mut self, product_id: &str, quantity: i64) -> DbResult<()> {
        self.check(FailPoint::Decrement).await?;

        match self.staged.products.get_mut(product_id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                product.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DbError::StockExhausted {
                product_id: product_id.to_string(),
                quantity,
            }),
        }
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;

        if guard.fail_at == Some(FailPoint::Commit) {
            return Err(injected(FailPoint::Commit));
        }

        guard.customers = staged.customers;
        guard.products = staged.products;
        guard.orders = staged.orders;

        pause(guard.stall, FailPoint::Commit).await;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        Ok(())
    }
}
