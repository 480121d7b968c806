//! # Error Types
//!
//! Domain-specific error types for resto-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  Validation  - bad input shape/range, detected before any write        │
//! │                (InvalidQuantity, ReturnExceedsDispatch, ...)           │
//! │  Conflict    - valid-but-already-satisfied state                       │
//! │                (DuplicateReturn, PayrollRunExists)                     │
//! │  NotFound    - missing employee/dispatch is hard not-found;            │
//! │                a missing plan degrades through the fallback chain      │
//! │                and is NOT an error                                     │
//! │                                                                         │
//! │  Storage errors live in resto-db (DbError) and wrap these.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, quantities)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Employee cannot be found.
    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    /// Dispatch cannot be found.
    #[error("Dispatch not found: {0}")]
    DispatchNotFound(String),

    /// A second return was attempted against an already-settled dispatch.
    ///
    /// The caller decides whether to treat this as success (idempotent
    /// re-read) or surface it. The prior return is never overwritten.
    #[error("Dispatch {dispatch_id} already has a return")]
    DuplicateReturn { dispatch_id: String },

    /// A payroll run already exists for the period and overwrite was not
    /// requested. Carries no data loss; the existing run stays untouched.
    #[error("Payroll run already exists for {year}-{month:02}")]
    PayrollRunExists { year: i32, month: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Always detected before any record is written, and surfaced with enough
/// detail to correct the input. Never retried automatically.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A quantity or cash figure is negative or otherwise malformed.
    #[error("Invalid {field}: {value}")]
    InvalidQuantity { field: &'static str, value: i64 },

    /// `qty_returned + loss_qty` exceeds the dispatched quantity.
    #[error(
        "Return exceeds dispatch: returned {qty_returned} + lost {loss_qty} > dispatched {qty_dispatched}"
    )]
    ReturnExceedsDispatch {
        qty_returned: i64,
        loss_qty: i64,
        qty_dispatched: i64,
    },

    /// Cash collected exceeds the computed sold amount.
    #[error("Cash collected {cash_cents} exceeds sold amount {sold_amount_cents} (cents)")]
    CashExceedsSoldAmount {
        cash_cents: i64,
        sold_amount_cents: i64,
    },

    /// Year/month pair does not denote a calendar month.
    #[error("Invalid payroll period: {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
