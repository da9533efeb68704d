//! # till-core: Pure Business Logic for Till
//!
//! This crate holds the checkout rules as pure functions with zero I/O
//! dependencies. Everything that decides whether a sale is acceptable lives
//! here; everything that persists it lives in `till-db` and `till-checkout`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Till Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                till-checkout (engine + queries)                 │   │
//! │  │        CheckoutEngine::submit        QueryService::list         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  pricing  │  │  payload  │  │   │
//! │  │   │   Order   │  │  checked  │  │  change   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, LineItem, CheckoutRequest)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Checkout payload validation
//! - [`checkout`] - Pricing, payment and change rules
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(1000);
//! let total = price.checked_mul_quantity(2).unwrap();
//!
//! assert_eq!(total.cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CheckoutPlan, PricedLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used by order listings when the caller does not give one.
pub const DEFAULT_PAGE_LIMIT: u32 = 5;

/// Offset used by order listings when the caller does not give one.
pub const DEFAULT_PAGE_OFFSET: u32 = 0;
