//! # Validation Module
//!
//! Write-path input checks for SimLedger records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (CLI / UI form)                                       │
//! │  └── Parsing (dates, numbers)                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Business rules (quantities, amounts, lengths)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (non-negative, one product reference)           │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read side never calls into this module; whatever is already stored
//! is aggregated as-is.
//!
//! ## Usage
//! ```rust
//! use simledger_core::validation::{validate_code, validate_order_quantity};
//!
//! validate_code("code", "SO-240301-001").unwrap();
//! assert!(validate_order_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BuyerRef, Customer, InventoryBatch, Payment, ProductRef, SaleOrder};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_CODE_LEN: usize = 50;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_REASON_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_chars(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a business code (`SO-240301-001`, `KH-5678-NA`, ...).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace inside
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    required(field, code)?;
    max_chars(field, code, MAX_CODE_LEN)?;

    if code.trim().chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name: non-empty, at most 200 characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name)?;
    max_chars(field, name, MAX_NAME_LEN)
}

/// Validates a due-date extension reason. May be empty.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    max_chars("reason", reason, MAX_REASON_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Orders must sell at least one unit.
pub fn validate_order_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Batches may be recorded empty but never negative.
pub fn validate_batch_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Money amounts are never negative; direction carries the sign.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

pub fn validate_batch(batch: &InventoryBatch) -> ValidationResult<()> {
    validate_code("code", &batch.code)?;
    validate_name("name", &batch.name)?;
    required("product_type_id", &batch.product_type_id)?;
    validate_batch_quantity(batch.quantity)?;
    validate_amount("total_import_cost", batch.total_import_cost)
}

/// ## Rules
/// - A customer reference must carry an id; a freeform name may be blank
/// - The product reference must carry an id
/// - Quantity > 0, unit price ≥ 0
pub fn validate_order(order: &SaleOrder) -> ValidationResult<()> {
    validate_code("code", &order.code)?;

    match &order.buyer {
        BuyerRef::Customer { customer_id, .. } => required("customer_id", customer_id)?,
        BuyerRef::Freeform { name } => max_chars("counterparty_name", name, MAX_NAME_LEN)?,
    }

    match &order.product {
        ProductRef::ByType(id) => required("product_type_id", id)?,
        ProductRef::ByBatch(id) => required("batch_id", id)?,
    }

    validate_order_quantity(order.quantity)?;
    validate_amount("unit_sale_price", order.unit_sale_price)
}

pub fn validate_payment(payment: &Payment) -> ValidationResult<()> {
    validate_code("code", &payment.code)?;
    validate_amount("amount", payment.amount)?;
    max_chars("category", &payment.category, MAX_NAME_LEN)
}

pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_code("customer_code", &customer.customer_code)?;
    validate_name("name", &customer.name)
}

// =============================================================================
// Unit Tests
// =============================================================================
