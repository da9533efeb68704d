//! # till-checkout: Checkout Engine for Till
//!
//! Records multi-item sales atomically against live inventory and serves the
//! order history.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Transport collaborator (auth, routing, JSON)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 till-checkout (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   CheckoutEngine::submit          QueryService::list            │   │
//! │  │          │                               │                      │   │
//! │  │          ▼                               ▼                      │   │
//! │  │   CheckoutStore (trait) ─────────── OrderStore (trait)          │   │
//! │  │          │                                                      │   │
//! │  │   ┌──────┴─────────────┐                                        │   │
//! │  │   │                    │                                        │   │
//! │  │   sqlite.rs         memory.rs                                   │   │
//! │  │   (till_db)         (tests)                                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let till = Till::connect(&TillConfig::load()?).await?;
//!
//! let order_id = till.checkout.submit(&request).await?;
//! let recent = till.orders.list(&OrderQuery::default()).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod query;
pub mod sqlite;
pub mod store;

pub use config::{CheckoutConfig, ConfigError, TillConfig};
pub use engine::CheckoutEngine;
pub use error::{CheckoutError, ErrorKind};
pub use memory::{FailPoint, MemoryStore};
pub use query::QueryService;
pub use store::{CheckoutStore, CustomerAccessor, InventoryAccessor, OrderStore, UnitOfWork};

use till_db::{Database, DbResult};
use tracing::info;

/// The exposed operations over one SQLite database.
#[derive(Debug, Clone)]
pub struct Till {
    pub checkout: CheckoutEngine<Database>,
    pub orders: QueryService<Database>,
    db: Database,
}

impl Till {
    /// Opens the database (running migrations) and wires both services to it.
    pub async fn connect(config: &TillConfig) -> DbResult<Self> {
        let db = Database::new(config.db_config()).await?;
        info!(
            commit_timeout_ms = config.commit_timeout.as_millis() as u64,
            "Till ready"
        );
        Ok(Till::new(db, config.checkout_config()))
    }

    pub fn new(db: Database, config: CheckoutConfig) -> Self {
        Till {
            checkout: CheckoutEngine::new(db.clone(), config),
            orders: QueryService::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
