//! # Checkout Engine
//!
//! `submit` turns a checkout request into a committed order or a typed error.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(request)                                                        │
//! │                                                                         │
//! │  0. payload shape            validate_checkout_request   → 400         │
//! │  1. customer exists?         CustomerAccessor            → 404         │
//! │  2. batch product lookup     InventoryAccessor           → 404         │
//! │  3. availability, stock      ┐                                         │
//! │  4. total (live price)       ├ CheckoutPlan::price       → 400         │
//! │  5. payment, change          ┘                                         │
//! │          │                                                              │
//! │          ▼  nothing written before this point                           │
//! │  ┌──────────────── unit of work (commit_timeout) ────────────────┐     │
//! │  │  a. create_header  → (order id, created_at)                   │     │
//! │  │  b. insert_lines   → all lines, request order                 │     │
//! │  │  c. decrement      → per line, guarded by stock >= qty        │     │
//! │  └───────────────────────────────────────────────────────────────┘     │
//! │          │ any failure or timeout: rollback                   → 500    │
//! │          ▼                                                              │
//! │  commit (not under the timeout)               failure         → 500    │
//! │          ▼                                                              │
//! │  Ok(order id)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The timeout only bounds the writes. Once COMMIT has been sent the store may
//! apply it whether or not the caller is still waiting, so the engine always
//! waits for the commit outcome before answering.
//!
//! Stock is checked twice: once against the snapshot read in step 2, and
//! again by the guarded decrement in step c, which is what actually prevents
//! overselling when checkouts race. The price is not re-read inside the unit
//! of work.

use tracing::{error, info, instrument, warn};

use till_core::validation::validate_checkout_request;
use till_core::{CheckoutPlan, CheckoutRequest, CoreError, OrderId};
use till_db::{DbResult, OrderHeader};

use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::store::{CheckoutStore, UnitOfWork};

/// Validates, prices and atomically records checkouts.
#[derive(Debug, Clone)]
pub struct CheckoutEngine<S> {
    store: S,
    config: CheckoutConfig,
}

impl<S: CheckoutStore> CheckoutEngine<S> {
    pub fn new(store: S, config: CheckoutConfig) -> Self {
        CheckoutEngine { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submits a checkout.
    ///
    /// ## Returns
    /// * `Ok(OrderId)` - order, lines and stock decrements are committed
    /// * `Err(NotFound)` - unknown customer or product
    /// * `Err(InvalidRequest)` - bad payload, unavailable product,
    ///   insufficient stock, insufficient payment or incorrect change
    /// * `Err(Internal)` - store failure; nothing was written
    #[instrument(
        skip(self, request),
        fields(customer_id = %request.customer_id, items = request.items.len())
    )]
    pub async fn submit(&self, request: &CheckoutRequest) -> Result<OrderId, CheckoutError> {
        validate_checkout_request(request).map_err(|e| reject(e.into()))?;

        let exists = self
            .store
            .customer_exists(&request.customer_id)
            .await
            .map_err(CheckoutError::from_store)?;
        if !exists {
            return Err(reject(CoreError::CustomerNotFound(
                request.customer_id.clone(),
            )));
        }

        let products = self
            .store
            .find_by_ids(&request.product_ids())
            .await
            .map_err(CheckoutError::from_store)?;

        let plan = CheckoutPlan::price(request, &products).map_err(reject)?;

        let (header, uow) =
            match tokio::time::timeout(self.config.commit_timeout, self.stage(&plan)).await {
                Ok(Ok(staged)) => staged,
                Ok(Err(e)) => return Err(CheckoutError::commit_failed(&e)),
                Err(_) => {
                    // The staging future was dropped, so its unit of work rolled back.
                    error!(
                        timeout_ms = self.config.commit_timeout.as_millis() as u64,
                        "Checkout timed out before commit"
                    );
                    return Err(CheckoutError::internal());
                }
            };

        uow.commit()
            .await
            .map_err(|e| CheckoutError::commit_failed(&e))?;

        info!(
            order_id = %header.id,
            total = %plan.total,
            paid = %plan.paid,
            change = %plan.change,
            lines = plan.lines.len(),
            "Checkout committed"
        );

        Ok(header.id)
    }

    /// Runs the three writes in one unit of work, leaving it ready to commit.
    async fn stage(&self, plan: &CheckoutPlan) -> DbResult<(OrderHeader, Box<dyn UnitOfWork>)> {
        let mut uow = self.store.begin().await?;

        match write_order(uow.as_mut(), plan).await {
            Ok(header) => Ok((header, uow)),
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

async fn write_order(uow: &mut dyn UnitOfWork, plan: &CheckoutPlan) -> DbResult<OrderHeader> {
    let header = uow
        .create_header(&plan.customer_id, plan.paid, plan.change)
        .await?;

    uow.insert_lines(&header.id, &plan.lines).await?;

    for line in &plan.lines {
        uow.decrement(&line.product_id, line.quantity).await?;
    }

    Ok(header)
}

fn reject(err: CoreError) -> CheckoutError {
    warn!(reason = %err, "Checkout rejected");
    CheckoutError::from(err)
}

// =============================================================================
// Unit Tests
// =============================================================================
