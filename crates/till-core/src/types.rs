//! # Domain Types
//!
//! Core domain types used throughout Till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (store)     │   │  order_id (FK)  │       │
//! │  │  price_cents    │   │  customer_id    │   │  product_id     │       │
//! │  │  stock (>= 0)   │   │  paid_cents     │   │  quantity       │       │
//! │  │  is_available   │   │  change_cents   │   │  unit_price     │       │
//! │  └─────────────────┘   │  items ─────────┼──►│  line_total     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CheckoutRequest │   │   OrderQuery    │   │  SortDirection  │       │
//! │  │  customer_id    │   │  (raw input)    │   │  Ascending      │       │
//! │  │  items          │   │       │         │   │  Descending     │       │
//! │  │  paid / change  │   │  OrderFilter    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `LineItem.unit_price_cents` is the price read at checkout time. Later
//! catalog price changes never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::{DEFAULT_PAGE_LIMIT, DEFAULT_PAGE_OFFSET};

/// Opaque order identifier, assigned by the store at creation.
pub type OrderId = String;

// =============================================================================
// Product
// =============================================================================

/// A catalog product, as far as checkout is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub name: String,

    /// Price in the smallest currency unit.
    pub price_cents: i64,

    /// Units on hand. Never negative once committed.
    pub stock: i64,

    /// Products flagged unavailable cannot be sold regardless of stock.
    pub is_available: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_available && self.stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer. Checkout only needs to know that one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Checkout Request
// =============================================================================

/// One requested (product, quantity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: i64,
}

impl CheckoutItem {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CheckoutItem {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A multi-item purchase submitted for checkout.
///
/// ## Example
/// ```rust
/// use till_core::{CheckoutItem, CheckoutRequest};
///
/// let request = CheckoutRequest {
///     customer_id: "C1".to_string(),
///     items: vec![CheckoutItem::new("P1", 2)],
///     paid_cents: 2000,
///     change_cents: 0,
/// };
/// assert_eq!(request.product_ids(), vec!["P1".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub items: Vec<CheckoutItem>,
    /// Amount handed over by the customer.
    pub paid_cents: i64,
    /// Change the cashier claims to return.
    pub change_cents: i64,
}

impl CheckoutRequest {
    /// Product ids in request order.
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.product_id.clone()).collect()
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A line of a committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl LineItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A committed checkout: header plus its line items. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    pub paid_cents: i64,
    pub change_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

impl Order {
    /// Sum of line totals.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total())
    }
}

// =============================================================================
// Order Queries
// =============================================================================

/// Sort direction on order creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Parses `asc` / `desc`. Anything else is not a sort direction.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Ascending),
            "desc" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    /// SQL keyword for this direction.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Order listing parameters exactly as the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub customer_id: Option<String>,
    /// Expected `asc` or `desc`; other values are ignored.
    pub created_at: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Normalized order listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub customer_id: Option<String>,
    pub sort: SortDirection,
    pub limit: u32,
    pub offset: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        OrderFilter {
            customer_id: None,
            sort: SortDirection::default(),
            limit: DEFAULT_PAGE_LIMIT,
            offset: DEFAULT_PAGE_OFFSET,
        }
    }
}

impl From<&OrderQuery> for OrderFilter {
    /// Applies listing defaults.
    ///
    /// ## Rules
    /// - empty customer id → no customer filter; any other value matches exactly
    /// - unknown sort → default (newest first)
    /// - missing or non-positive limit → 5
    /// - missing or negative offset → 0
    fn from(query: &OrderQuery) -> Self {
        let customer_id = query
            .customer_id
            .as_ref()
            .filter(|id| !id.is_empty())
            .cloned();

        let sort = query
            .created_at
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or_default();

        let limit = query
            .limit
            .filter(|l| *l > 0)
            .map(|l| u32::try_from(l).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        let offset = query
            .offset
            .filter(|o| *o >= 0)
            .map(|o| u32::try_from(o).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_PAGE_OFFSET);

        OrderFilter {
            customer_id,
            sort,
            limit,
            offset,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
