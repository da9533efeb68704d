//! # Repository Module
//!
//! Database repository implementations for Till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CheckoutEngine / QueryService                                         │
//! │       │                                                                 │
//! │       │  db.products().find_by_ids(&ids)                               │
//! │       ▼                                                                 │
//! │  ProductRepository  CustomerRepository  OrderRepository                │
//! │       │                                                                 │
//! │       │  pool reads             │  writes on &mut SqliteConnection      │
//! │       ▼                         ▼  (the caller's transaction)          │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads run on the pool. Checkout writes are associated functions that
//! take the transaction's connection, so one unit of work spans repositories.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog lookups and stock decrements
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer existence and inserts
//! - [`OrderRepository`](order::OrderRepository) - Order creation and listing

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

pub mod customer;
pub mod order;
pub mod product;

/// Current time truncated to what [`timestamp`] stores.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 text, so `ORDER BY created_at` sorts chronologically.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
