//! # Query Service
//!
//! Paged, read-only access to committed orders.
//!
//! ```text
//! OrderQuery (raw) ──► OrderFilter (defaults applied) ──► OrderStore::find_many
//!
//!   customerId  empty/absent → all customers, otherwise exact match
//!   createdAt   "asc" | "desc", anything else → "desc"
//!   limit       absent or <= 0 → 5
//!   offset      absent or < 0  → 0
//! ```

use tracing::instrument;

use till_core::{Order, OrderFilter, OrderQuery};

use crate::error::CheckoutError;
use crate::store::OrderStore;

/// Read-through over an [`OrderStore`].
#[derive(Debug, Clone)]
pub struct QueryService<S> {
    store: S,
}

impl<S: OrderStore> QueryService<S> {
    pub fn new(store: S) -> Self {
        QueryService { store }
    }

    /// Lists orders, each with its line items.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, CheckoutError> {
        self.list_filtered(&OrderFilter::from(query)).await
    }

    /// Lists orders with an already-normalized filter.
    pub async fn list_filtered(&self, filter: &OrderFilter) -> Result<Vec<Order>, CheckoutError> {
        self.store
            .find_many(filter)
            .await
            .map_err(CheckoutError::from_store)
    }

    /// Fetches one order by id.
    pub async fn get(&self, order_id: &str) -> Result<Order, CheckoutError> {
        self.store
            .find_order(order_id)
            .await
            .map_err(CheckoutError::from_store)?
            .ok_or_else(|| CheckoutError::not_found(format!("Order not found: {order_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::MemoryStore;
    use crate::store::CheckoutStore;
    use chrono::Utc;
    use till_core::{Customer, Money, PricedLine, Product};

    async fn store_with_orders(customers: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for (i, id) in ["C1", "C2"].iter().enumerate() {
            store
                .insert_customer(Customer {
                    id: id.to_string(),
                    name: id.to_string(),
                    phone_number: format!("555-000{i}"),
                    created_at: Utc::now(),
                })
                .await;
        }
        let now = Utc::now();
        store
            .insert_product(Product {
                id: "P1".to_string(),
                sku: "SKU-P1".to_string(),
                name: "P1".to_string(),
                price_cents: 100,
                stock: 1000,
                is_available: true,
                created_at: now,
                updated_at: now,
            })
            .await;

        for customer_id in customers {
            let mut uow = store.begin().await.unwrap();
            let header = uow
                .create_header(customer_id, Money::from_cents(100), Money::zero())
                .await
                .unwrap();
            uow.insert_lines(
                &header.id,
                &[PricedLine {
                    product_id: "P1".to_string(),
                    quantity: 1,
                    unit_price_cents: 100,
                    line_total_cents: 100,
                }],
            )
            .await
            .unwrap();
            uow.commit().await.unwrap();
        }
        store
    }

    fn ids(orders: &[Order]) -> Vec<&str> {
        orders.iter().map(|o| o.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_defaults_newest_first_five() {
        let service = QueryService::new(store_with_orders(&["C1"; 7]).await);

        let orders = service.list(&OrderQuery::default()).await.unwrap();
        assert_eq!(
            ids(&orders),
            vec!["order-7", "order-6", "order-5", "order-4", "order-3"]
        );
        assert!(orders.iter().all(|o| o.items.len() == 1));
    }

    #[tokio::test]
    async fn test_unknown_sort_falls_back_to_desc() {
        let service = QueryService::new(store_with_orders(&["C1", "C1", "C1"]).await);

        let query = OrderQuery {
            created_at: Some("sideways".to_string()),
            ..Default::default()
        };
        let fallback = service.list(&query).await.unwrap();
        let default = service.list(&OrderQuery::default()).await.unwrap();
        assert_eq!(fallback, default);

        let query = OrderQuery {
            created_at: Some("asc".to_string()),
            ..Default::default()
        };
        let asc = service.list(&query).await.unwrap();
        assert_eq!(ids(&asc), vec!["order-1", "order-2", "order-3"]);
    }

    #[tokio::test]
    async fn test_customer_filter_and_paging() {
        let service =
            QueryService::new(store_with_orders(&["C1", "C2", "C1", "C2", "C1"]).await);

        let query = OrderQuery {
            customer_id: Some("C1".to_string()),
            created_at: Some("asc".to_string()),
            limit: Some(2),
            offset: Some(1),
        };
        let orders = service.list(&query).await.unwrap();
        assert_eq!(ids(&orders), vec!["order-3", "order-5"]);

        let query = OrderQuery {
            limit: Some(-4),
            offset: Some(-1),
            ..Default::default()
        };
        assert_eq!(service.list(&query).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let service = QueryService::new(store_with_orders(&["C1", "C2", "C1"]).await);
        let query = OrderQuery {
            customer_id: Some("C1".to_string()),
            ..Default::default()
        };

        let first = service.list(&query).await.unwrap();
        let second = service.list(&query).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get() {
        let service = QueryService::new(store_with_orders(&["C2"]).await);

        assert_eq!(service.get("order-1").await.unwrap().customer_id, "C2");
        assert_eq!(
            service.get("order-9").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
