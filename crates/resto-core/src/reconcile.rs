//! # Field Dispatch Reconciliation
//!
//! Computes what was actually sold from a dispatch/return pair.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dispatched ──► returned / lost ──► sold ──► cash collected            │
//! │                                                                         │
//! │  sold_qty    = qty_dispatched − qty_returned − loss_qty                │
//! │  sold_amount = sold_qty × price_each                                   │
//! │  gross_sales = qty_dispatched × price_each                             │
//! │                                                                         │
//! │  Conservation: qty_returned + loss_qty + sold_qty == qty_dispatched    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `reconcile` is a pure function with no I/O. The constraints that make it
//! safe (non-negative quantities, returned + lost never exceeding the
//! dispatch, cash never exceeding the sold amount) are enforced at
//! return-creation time by [`validate_return`], and again by the storage
//! layer's constraints.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{FieldDispatch, FieldReturn, NewFieldReturn};

// =============================================================================
// Settlement
// =============================================================================

/// The reconciled outcome of a settled dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Quantity actually sold, never negative.
    pub sold_qty: i64,
    /// Monetary value of the sold quantity.
    pub sold_amount: Money,
    /// Full dispatched value before netting returns and losses.
    pub gross_sales: Money,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Reconciles a dispatch against its paired return.
///
/// `sold_qty` is clamped to be non-negative. Creation-time validation
/// already guarantees the clamp never fires for stored records, but the
/// function stays total for arbitrary inputs.
///
/// All values are integer cents, so the 2-decimal rounding the reporting
/// boundary requires is exact by construction here.
pub fn reconcile(dispatch: &FieldDispatch, ret: &FieldReturn) -> Settlement {
    let sold_qty = (dispatch.qty_dispatched - ret.qty_returned - ret.loss_qty).max(0);

    Settlement {
        sold_qty,
        sold_amount: dispatch.price_each().multiply_quantity(sold_qty),
        gross_sales: dispatch.gross_sales(),
    }
}

/// Validates return fields against their dispatch before anything is written.
///
/// Enforced in order:
/// - `qty_returned`, `loss_qty`, `cash_collected` all non-negative
/// - `qty_returned + loss_qty <= qty_dispatched` (`ReturnExceedsDispatch`)
/// - `cash_collected <= sold_amount` (`CashExceedsSoldAmount`)
///
/// Uniqueness (at most one return per dispatch) is a storage concern and is
/// checked at the persistence boundary.
pub fn validate_return(
    dispatch: &FieldDispatch,
    fields: &NewFieldReturn,
) -> Result<(), ValidationError> {
    if fields.qty_returned < 0 {
        return Err(ValidationError::InvalidQuantity {
            field: "qty_returned",
            value: fields.qty_returned,
        });
    }
    if fields.loss_qty < 0 {
        return Err(ValidationError::InvalidQuantity {
            field: "loss_qty",
            value: fields.loss_qty,
        });
    }
    if fields.cash_collected_cents < 0 {
        return Err(ValidationError::InvalidQuantity {
            field: "cash_collected",
            value: fields.cash_collected_cents,
        });
    }

    if fields.qty_returned + fields.loss_qty > dispatch.qty_dispatched {
        return Err(ValidationError::ReturnExceedsDispatch {
            qty_returned: fields.qty_returned,
            loss_qty: fields.loss_qty,
            qty_dispatched: dispatch.qty_dispatched,
        });
    }

    let sold_qty = dispatch.qty_dispatched - fields.qty_returned - fields.loss_qty;
    let sold_amount = dispatch.price_each().multiply_quantity(sold_qty);
    if Money::from_cents(fields.cash_collected_cents) > sold_amount {
        return Err(ValidationError::CashExceedsSoldAmount {
            cash_cents: fields.cash_collected_cents,
            sold_amount_cents: sold_amount.cents(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
