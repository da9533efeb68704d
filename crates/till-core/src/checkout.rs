//! # Checkout Rules
//!
//! Turns a validated request plus the live product records into a priced
//! plan, or the first rule it breaks.
//!
//! ## Rule Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutPlan::price(request, products)                                 │
//! │                                                                         │
//! │  1. every requested id resolved?      no → ProductNotFound             │
//! │  2. every item, in request order:                                      │
//! │       available?                      no → ProductUnavailable          │
//! │       quantity <= stock?              no → InsufficientStock           │
//! │  3. then total = Σ price × quantity   overflow → AmountOverflow        │
//! │  4. total <= paid?                    no → InsufficientPayment         │
//! │  5. paid - total == claimed change?   no → IncorrectChange             │
//! │                                                                         │
//! │  → CheckoutPlan { lines, total, change }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The price used here is whatever the catalog said when the products were
//! read. It is not re-read inside the unit of work.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CheckoutRequest, LineItem, Product};

/// One line of a plan, priced but not yet attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl PricedLine {
    /// Attaches this line to a committed order id.
    pub fn into_line_item(self, order_id: &str) -> LineItem {
        LineItem {
            order_id: order_id.to_string(),
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            line_total_cents: self.line_total_cents,
        }
    }
}

/// Everything the commit step needs, already checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub customer_id: String,
    pub paid: Money,
    pub total: Money,
    pub change: Money,
    /// Lines in request order.
    pub lines: Vec<PricedLine>,
}

impl CheckoutPlan {
    /// Applies the checkout rules.
    ///
    /// `products` is the result of a batch lookup; records for ids that were
    /// not requested are ignored and missing ids are detected by count.
    pub fn price(request: &CheckoutRequest, products: &[Product]) -> CoreResult<Self> {
        let requested: HashSet<&str> = request
            .items
            .iter()
            .map(|i| i.product_id.as_str())
            .collect();

        let by_id: HashMap<&str, &Product> = products
            .iter()
            .filter(|p| requested.contains(p.id.as_str()))
            .map(|p| (p.id.as_str(), p))
            .collect();

        if by_id.len() != requested.len() {
            let missing = request
                .items
                .iter()
                .find(|i| !by_id.contains_key(i.product_id.as_str()))
                .map(|i| i.product_id.clone())
                .unwrap_or_default();
            return Err(CoreError::ProductNotFound(missing));
        }

        // Every product passes availability and stock before any total is computed.
        let mut stocked = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = by_id
                .get(item.product_id.as_str())
                .copied()
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            if !product.can_sell(item.quantity) {
                return Err(if product.is_available {
                    CoreError::InsufficientStock {
                        product_id: product.id.clone(),
                        available: product.stock,
                        requested: item.quantity,
                    }
                } else {
                    CoreError::ProductUnavailable {
                        product_id: product.id.clone(),
                    }
                });
            }

            stocked.push((item, product));
        }

        let mut lines = Vec::with_capacity(stocked.len());
        let mut total = Money::zero();
        for (item, product) in stocked {
            let line_total = product
                .price()
                .checked_mul_quantity(item.quantity)
                .ok_or(CoreError::AmountOverflow)?;
            total = total
                .checked_add(line_total)
                .ok_or(CoreError::AmountOverflow)?;

            lines.push(PricedLine {
                product_id: product.id.clone(),
                quantity: item.quantity,
                unit_price_cents: product.price_cents,
                line_total_cents: line_total.cents(),
            });
        }

        let paid = request.paid();
        if total > paid {
            return Err(CoreError::InsufficientPayment {
                total_cents: total.cents(),
                paid_cents: paid.cents(),
            });
        }

        let change = paid.checked_sub(total).ok_or(CoreError::AmountOverflow)?;
        if change != request.change() {
            return Err(CoreError::IncorrectChange {
                expected_cents: change.cents(),
                claimed_cents: request.change_cents,
            });
        }

        Ok(CheckoutPlan {
            customer_id: request.customer_id.clone(),
            paid,
            total,
            change,
            lines,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
