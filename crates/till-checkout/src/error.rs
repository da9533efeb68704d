//! # Checkout Error Boundary
//!
//! The one error type callers of [`CheckoutEngine`](crate::CheckoutEngine)
//! and [`QueryService`](crate::QueryService) see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┬── *NotFound ─────────► NotFound  404 │
//! │                                  └── everything else ───► Invalid   400 │
//! │                                                                         │
//! │  DbError (reads) ────────────────┬── UniqueViolation ───► Conflict  409 │
//! │                                  └── everything else ───► Internal  500 │
//! │                                                                         │
//! │  DbError (commit) / timeout ────────────────────────────► Internal  500 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged with their cause; the caller only gets a
//! generic message and never learns which commit step failed.
//!
//! ## Serialization
//! ```json
//! {
//!   "kind": "INVALID_REQUEST",
//!   "message": "Insufficient stock for P1: available 3, requested 5"
//! }
//! ```

use serde::Serialize;
use thiserror::Error;
use till_core::{CoreError, ValidationError};
use till_db::DbError;
use tracing::error;

/// Error categories with stable status signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Customer, product or order does not exist (404)
    NotFound,

    /// Payload or business rule rejected the request (400)
    InvalidRequest,

    /// Uniqueness violation reported by an accessor (409)
    Conflict,

    /// Store unreachable or commit failed (500)
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidRequest => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

/// Error returned by checkout and order queries.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CheckoutError {
    /// Machine-readable category
    pub kind: ErrorKind,

    /// Human-readable message
    pub message: String,
}

impl CheckoutError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CheckoutError {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CheckoutError::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        CheckoutError::new(ErrorKind::InvalidRequest, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CheckoutError::new(ErrorKind::Conflict, message)
    }

    /// Generic internal error. Log the cause before calling this.
    pub fn internal() -> Self {
        CheckoutError::new(ErrorKind::Internal, "Internal error")
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Converts a failure from a read outside the unit of work.
    pub fn from_store(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, value } => {
                CheckoutError::conflict(format!("Duplicate {field}: '{value}'"))
            }
            DbError::NotFound { entity, id } => {
                CheckoutError::not_found(format!("{entity} not found: {id}"))
            }
            other => {
                error!(error = %other, "Store operation failed");
                CheckoutError::internal()
            }
        }
    }

    /// Converts any failure inside the unit of work. Always internal.
    pub fn commit_failed(err: &DbError) -> Self {
        error!(error = %err, "Checkout commit failed; unit of work discarded");
        CheckoutError::internal()
    }
}

/// Domain rejections become NotFound or InvalidRequest.
impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        if err.is_not_found() {
            CheckoutError::not_found(err.to_string())
        } else {
            CheckoutError::invalid_request(err.to_string())
        }
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::from(CoreError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::InvalidRequest.status_code(), 400);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn test_core_errors() {
        let err = CheckoutError::from(CoreError::CustomerNotFound("C9".to_string()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = CheckoutError::from(CoreError::ProductNotFound("P9".to_string()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = CheckoutError::from(CoreError::InsufficientPayment {
            total_cents: 2000,
            paid_cents: 1500,
        });
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.status_code(), 400);

        let err = CheckoutError::from(ValidationError::Duplicate {
            field: "productId".to_string(),
            value: "P1".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_store_errors() {
        let err = CheckoutError::from_store(DbError::duplicate("phone_number", "555"));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = CheckoutError::from_store(DbError::PoolExhausted);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message, "Internal error");
    }

    #[test]
    fn test_commit_failures_hide_cause() {
        let err = CheckoutError::commit_failed(&DbError::StockExhausted {
            product_id: "P1".to_string(),
            quantity: 2,
        });
        assert_eq!(err, CheckoutError::internal());

        let err = CheckoutError::commit_failed(&DbError::duplicate("order_items", "P1"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_serializes_kind_and_message() {
        let json = serde_json::to_value(CheckoutError::not_found("Customer not found: C9")).unwrap();
        assert_eq!(json["kind"], "NOT_FOUND");
        assert_eq!(json["message"], "Customer not found: C9");
    }
}
