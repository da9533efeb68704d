//! # Validation Module
//!
//! Payload validation for checkout requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport collaborator                                       │
//! │  ├── Deserialization, field presence                                   │
//! │  └── Immediate "fix your request" feedback                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (payload shape)                                  │
//! │  ├── customer id present, items non-empty                              │
//! │  ├── quantity >= 1, paid >= 1, change >= 0                             │
//! │  └── no product listed twice                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: checkout rules (checkout.rs) against live records            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (CHECK (stock >= 0), foreign keys)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_paid, validate_quantity};
//!
//! assert!(validate_quantity(2).is_ok());
//! assert!(validate_paid(0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{CheckoutItem, CheckoutRequest};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required identifier field (customer id, product id).
pub fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates the amount paid.
///
/// ## Rules
/// - Must be at least 1
pub fn validate_paid(cents: i64) -> ValidationResult<()> {
    if cents < 1 {
        return Err(ValidationError::MustBePositive {
            field: "paid".to_string(),
        });
    }

    Ok(())
}

/// Validates the claimed change.
///
/// ## Rules
/// - Zero is allowed (exact payment)
/// - Negative is never allowed
pub fn validate_change(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "change".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the requested items.
///
/// ## Rules
/// - At least one item
/// - Every item names a product and a positive quantity
/// - A product id appears at most once (duplicates are rejected, not merged)
pub fn validate_items(items: &[CheckoutItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
    for item in items {
        validate_id("productId", &item.product_id)?;
        validate_quantity(item.quantity)?;

        if !seen.insert(item.product_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "productId".to_string(),
                value: item.product_id.clone(),
            });
        }
    }

    Ok(())
}

/// Validates the whole payload in field order: customer, items, paid, change.
pub fn validate_checkout_request(request: &CheckoutRequest) -> ValidationResult<()> {
    validate_id("customerId", &request.customer_id)?;
    validate_items(&request.items)?;
    validate_paid(request.paid_cents)?;
    validate_change(request.change_cents)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<CheckoutItem>, paid: i64, change: i64) -> CheckoutRequest {
        CheckoutRequest {
            customer_id: "C1".to_string(),
            items,
            paid_cents: paid,
            change_cents: change,
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100_000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_paid_and_change() {
        assert!(validate_paid(1).is_ok());
        assert!(validate_paid(0).is_err());
        assert!(validate_change(0).is_ok());
        assert!(validate_change(-1).is_err());
    }

    #[test]
    fn test_rejects_duplicate_products() {
        let err = validate_items(&[
            CheckoutItem::new("P1", 1),
            CheckoutItem::new("P2", 1),
            CheckoutItem::new("P1", 3),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::Duplicate {
                field: "productId".to_string(),
                value: "P1".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_empty_items() {
        let err = validate_checkout_request(&request(vec![], 100, 0)).unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn test_field_order() {
        // Blank customer id is reported before the bad quantity.
        let mut req = request(vec![CheckoutItem::new("P1", 0)], 0, -1);
        req.customer_id = " ".to_string();
        assert!(matches!(
            validate_checkout_request(&req).unwrap_err(),
            ValidationError::Required { .. }
        ));

        // Bad quantity is reported before bad paid.
        let req = request(vec![CheckoutItem::new("P1", 0)], 0, -1);
        assert_eq!(
            validate_checkout_request(&req).unwrap_err(),
            ValidationError::MustBePositive {
                field: "quantity".to_string()
            }
        );
    }

    #[test]
    fn test_valid_request() {
        let req = request(
            vec![CheckoutItem::new("P1", 2), CheckoutItem::new("P2", 1)],
            2000,
            0,
        );
        assert!(validate_checkout_request(&req).is_ok());
    }
}
