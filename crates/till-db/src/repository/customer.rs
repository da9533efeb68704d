//! # Customer Repository
//!
//! Checkout only asks one question of customers: does this id exist?
//! Inserts exist for seeding and tests.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::timestamp;
use crate::error::DbResult;
use till_core::Customer;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Returns whether a customer with this id exists.
    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        debug!(id = %id, exists = found.is_some(), "Customer lookup");
        Ok(found.is_some())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone_number, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id or phone number already exists
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, name, phone_number, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone_number)
        .bind(timestamp(customer.created_at))
        .execute(&self.pool)
        .await?;

        Ok(customer.clone())
    }

    /// Counts customers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}
