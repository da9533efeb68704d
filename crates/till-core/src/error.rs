//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Checkout rule violations                       │
//! │  └── ValidationError  - Malformed checkout payloads                    │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  till-checkout errors (boundary)                                       │
//! │  └── CheckoutError    - NotFound / InvalidRequest / Conflict / Internal│
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Checkout rule violations.
///
/// Every variant is detected before any write begins, so returning one of
/// these never leaves anything behind in the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The customer referenced by the request does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// At least one requested product id did not resolve.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is flagged as not available for sale.
    #[error("Product unavailable: {product_id}")]
    ProductUnavailable { product_id: String },

    /// Requested quantity exceeds current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P1", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Amount paid does not cover the order total.
    #[error("Insufficient payment: total {total_cents}, paid {paid_cents}")]
    InsufficientPayment { total_cents: i64, paid_cents: i64 },

    /// Claimed change differs from `paid - total`.
    #[error("Incorrect change: expected {expected_cents}, claimed {claimed_cents}")]
    IncorrectChange {
        expected_cents: i64,
        claimed_cents: i64,
    },

    /// Order total does not fit in the money representation.
    #[error("Order total overflows")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the variants that mean "a referenced record does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::CustomerNotFound(_) | CoreError::ProductNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Payload validation errors.
///
/// These mirror the field-level checks a transport layer would run, so the
/// engine rejects a malformed request even when called directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Collection must contain at least one element.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// The same value appears twice where each must be unique.
    #[error("{field} '{value}' is listed more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
