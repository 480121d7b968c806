//! # Validation Module
//!
//! Input validation for dispatch creation and payroll periods.
//!
//! Return settlement has its own, richer validation next to the math it
//! protects; see [`crate::reconcile::validate_return`].

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a dispatched quantity.
///
/// ## Rules
/// - Must be positive (> 0); a dispatch of nothing is meaningless
pub fn validate_dispatch_qty(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::InvalidQuantity { field: "qty_dispatched", value: qty });
    }
    Ok(())
}

/// Validates a unit price in cents.
///
/// Zero is allowed (promo stock handed out free still needs reconciling).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::InvalidQuantity { field: "price_each", value: cents });
    }
    Ok(())
}

/// Validates a payroll period.
///
/// ## Rules
/// - month in 1..=12
/// - year in 2000..=2100; the range guards against typo years without
///   constraining real use
pub fn validate_period(year: i32, month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) || !(2000..=2100).contains(&year) {
        return Err(ValidationError::InvalidPeriod { year, month });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
