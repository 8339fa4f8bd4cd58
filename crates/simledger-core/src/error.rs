//! # Error Types
//!
//! Domain-specific error types for simledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  simledger-core errors (this file)                                      │
//! │  ├── CoreError        - Write-path planning and configuration errors    │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  simledger-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → AppError                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read side (inventory, orders, customers, reports) never returns an
//! error: missing lookups fall back to labels and odd figures such as
//! negative stock are reported as-is.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sale order cannot be found in the snapshot.
    #[error("Sale order not found: {0}")]
    OrderNotFound(String),

    /// Engine configuration is inconsistent.
    ///
    /// ## When This Occurs
    /// - `cache_bucket_secs` is zero
    /// - `warning_change_count` is not below `recovery_change_count`
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised on the write path before a record reaches the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., bad code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
