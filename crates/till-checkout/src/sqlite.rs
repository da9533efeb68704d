//! SQLite implementations of the store seams, backed by [`till_db::Database`].

use async_trait::async_trait;
use till_core::{Money, Order, OrderFilter, PricedLine, Product};
use till_db::{
    Database, DbError, DbResult, DbTransaction, OrderHeader, OrderRepository, ProductRepository,
};
use tracing::debug;

use crate::store::{CheckoutStore, CustomerAccessor, InventoryAccessor, OrderStore, UnitOfWork};

#[async_trait]
impl CustomerAccessor for Database {
    async fn customer_exists(&self, id: &str) -> DbResult<bool> {
        self.customers().exists(id).await
    }
}

#[async_trait]
impl InventoryAccessor for Database {
    async fn find_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.products().get_by_id(id).await
    }

    async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        self.products().find_by_ids(ids).await
    }
}

#[async_trait]
impl OrderStore for Database {
    async fn find_many(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        self.orders().find_many(filter).await
    }

    async fn find_order(&self, id: &str) -> DbResult<Option<Order>> {
        self.orders().get_by_id(id).await
    }
}

#[async_trait]
impl CheckoutStore for Database {
    async fn begin(&self) -> DbResult<Box<dyn UnitOfWork>> {
        let tx = Database::begin(self).await?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }
}

/// A checkout's writes on one SQLite transaction.
///
/// Dropping it without `commit` rolls the transaction back.
pub struct SqliteUnitOfWork {
    tx: DbTransaction,
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn create_header(
        &mut self,
        customer_id: &str,
        paid: Money,
        change: Money,
    ) -> DbResult<OrderHeader> {
        OrderRepository::create_header(&mut self.tx, customer_id, paid.cents(), change.cents())
            .await
    }

    async fn insert_lines(&mut self, order_id: &str, lines: &[PricedLine]) -> DbResult<()> {
        OrderRepository::insert_lines(&mut self.tx, order_id, lines).await
    }

    async fn decrement(&mut self, product_id: &str, quantity: i64) -> DbResult<()> {
        ProductRepository::decrement_stock(&mut self.tx, product_id, quantity).await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx.commit().await.map_err(DbError::transaction)?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.tx.rollback().await.map_err(DbError::transaction)?;
        debug!("Transaction rolled back");
        Ok(())
    }
}
