//! # Commission Aggregator
//!
//! Sums per-employee commission and cash figures over a dispatch set.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each SETTLED dispatch (pending ones contribute nothing):           │
//! │                                                                         │
//! │    reconcile ──► sold_amount                                           │
//! │    resolve   ──► commission for THIS dispatch's sold_amount            │
//! │                                                                         │
//! │  Accumulate per employee:                                              │
//! │    sold_amount, commission, cash_remit, gross_sales,                   │
//! │    distinct dispatch dates → active_days                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commission is resolved per dispatch, never on the aggregated total:
//! bracket payouts are non-linear, so summing first would change the payout.
//!
//! `active_days` counts distinct calendar days from the dispatch's business
//! `date`, not `created_at`: a late-night settlement entered after midnight
//! must not inflate the day count.

use std::collections::{BTreeMap, BTreeSet};

use crate::commission::{self, DegradeReason, PlanBook};
use crate::money::Money;
use crate::reconcile;
use crate::types::{FieldDispatch, FieldReturn, Role};

// =============================================================================
// Summary Types
// =============================================================================

/// Per-employee commission summary over an aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmployeeSummary {
    pub sold_amount: Money,
    pub commission: Money,
    /// Sum of cash physically handed in.
    pub cash_remit: Money,
    pub gross_sales: Money,
    /// Cardinality of the distinct dispatch-date set, not a dispatch count.
    pub active_days: usize,
    /// Degrade markers collected from per-dispatch resolutions. Non-empty
    /// means this employee's figures came (partly) from the static fallback
    /// table; surfaced for observability, never an error.
    pub degraded: Vec<DegradeReason>,
}

/// Aggregation output keyed by employee id.
///
/// BTreeMap keeps iteration deterministic, which keeps payroll line order
/// and test assertions stable.
pub type CommissionTotals = BTreeMap<String, EmployeeSummary>;

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregates settled dispatches into per-employee totals.
///
/// Dispatches without a paired return are excluded entirely; they earn no
/// commission until settled. Plans come from the preloaded `book`, read in
/// the same snapshot as the dispatches.
pub fn aggregate(
    dispatches: &[(FieldDispatch, Option<FieldReturn>)],
    book: &PlanBook,
    role: Role,
) -> CommissionTotals {
    let mut totals: CommissionTotals = BTreeMap::new();
    let mut days: BTreeMap<String, BTreeSet<chrono::NaiveDate>> = BTreeMap::new();

    for (dispatch, ret) in dispatches {
        let ret = match ret {
            Some(r) => r,
            None => continue, // pending: no commission until settled
        };

        let settlement = reconcile::reconcile(dispatch, ret);
        let resolution =
            commission::resolve_for_employee(book, &dispatch.waiter_id, role, settlement.sold_amount);

        let entry = totals.entry(dispatch.waiter_id.clone()).or_default();
        entry.sold_amount += settlement.sold_amount;
        entry.commission += resolution.commission;
        entry.cash_remit += ret.cash_collected();
        entry.gross_sales += settlement.gross_sales;
        if let Some(reason) = resolution.degraded {
            if !entry.degraded.contains(&reason) {
                entry.degraded.push(reason);
            }
        }

        days.entry(dispatch.waiter_id.clone()).or_default().insert(dispatch.date);
    }

    for (employee_id, dates) in days {
        if let Some(entry) = totals.get_mut(&employee_id) {
            entry.active_days = dates.len();
        }
    }

    totals
}

/// Grand totals across employees.
///
/// Summed from the per-employee figures, which are already terminal values;
/// the documented consequence is that a grand total may differ by a few
/// cents from summing raw unrounded figures when fractional currencies are
/// in play. Integer cents make the sums exact here, but the summation order
/// is kept for parity with reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrandTotals {
    pub sold_amount: Money,
    pub commission: Money,
    pub cash_remit: Money,
    pub gross_sales: Money,
}

pub fn grand_totals(totals: &CommissionTotals) -> GrandTotals {
    let mut g = GrandTotals::default();
    for summary in totals.values() {
        g.sold_amount += summary.sold_amount;
        g.commission += summary.commission;
        g.cash_remit += summary.cash_remit;
        g.gross_sales += summary.gross_sales;
    }
    g
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommissionPlan, FieldDispatch, FieldReturn};
    use chrono::{NaiveDate, Utc};

    const BRACKETS: &str =
        r#"[{"min":100,"max":500,"fixed":100},{"min":501,"max":750,"fixed":200}]"#;

    fn book() -> PlanBook {
        let mut book = PlanBook::new();
        book.insert_default(CommissionPlan {
            id: "default-field".to_string(),
            name: "Field default".to_string(),
            role: Role::Field,
            is_default: true,
            brackets_json: BRACKETS.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        book
    }

    fn dispatch(id: &str, waiter: &str, qty: i64, price_cents: i64, day: u32) -> FieldDispatch {
        FieldDispatch {
            id: id.to_string(),
            waiter_id: waiter.to_string(),
            item_id: "item".to_string(),
            qty_dispatched: qty,
            price_each_cents: price_cents,
            date: NaiveDate::from_ymd_opt(2025, 11, day).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn ret(dispatch_id: &str, qty_returned: i64, loss: i64, cash_cents: i64) -> FieldReturn {
        FieldReturn {
            id: format!("ret-{dispatch_id}"),
            dispatch_id: dispatch_id.to_string(),
            qty_returned,
            loss_qty: loss,
            cash_collected_cents: cash_cents,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_dispatches_excluded() {
        let pairs = vec![
            (dispatch("d1", "w1", 10, 5000, 3), Some(ret("d1", 2, 0, 40_000))),
            (dispatch("d2", "w1", 10, 5000, 4), None),
        ];
        let totals = aggregate(&pairs, &book(), Role::Field);
        let s = &totals["w1"];
        // Only d1 counts: sold 8 × 50.00 = 400.00
        assert_eq!(s.sold_amount, Money::from_units(400));
        assert_eq!(s.active_days, 1);
        assert_eq!(s.gross_sales, Money::from_units(500));
    }

    #[test]
    fn test_commission_is_per_dispatch_not_on_total() {
        // Two dispatches each selling 400.00: per-dispatch lookup pays
        // 100 + 100 = 200, while a lookup on the 800.00 total would pay 0
        // (above the last bracket). Summing first would change payouts.
        let pairs = vec![
            (dispatch("d1", "w1", 10, 5000, 3), Some(ret("d1", 2, 0, 0))),
            (dispatch("d2", "w1", 10, 5000, 4), Some(ret("d2", 2, 0, 0))),
        ];
        let totals = aggregate(&pairs, &book(), Role::Field);
        assert_eq!(totals["w1"].commission, Money::from_units(200));
        assert_eq!(totals["w1"].sold_amount, Money::from_units(800));
    }

    #[test]
    fn test_active_days_distinct_dates() {
        let pairs = vec![
            (dispatch("d1", "w1", 4, 5000, 3), Some(ret("d1", 0, 0, 0))),
            (dispatch("d2", "w1", 4, 5000, 3), Some(ret("d2", 0, 0, 0))),
            (dispatch("d3", "w1", 4, 5000, 7), Some(ret("d3", 0, 0, 0))),
        ];
        let totals = aggregate(&pairs, &book(), Role::Field);
        // Three dispatches over two distinct days
        assert_eq!(totals["w1"].active_days, 2);
    }

    #[test]
    fn test_cash_remit_sums_collected_cash() {
        let pairs = vec![
            (dispatch("d1", "w1", 10, 5000, 3), Some(ret("d1", 2, 0, 35_000))),
            (dispatch("d2", "w1", 10, 5000, 4), Some(ret("d2", 5, 0, 20_000))),
        ];
        let totals = aggregate(&pairs, &book(), Role::Field);
        assert_eq!(totals["w1"].cash_remit, Money::from_cents(55_000));
    }

    #[test]
    fn test_degraded_marker_surfaces() {
        // Empty book: every resolution runs on the static fallback
        let pairs = vec![(dispatch("d1", "w1", 10, 5000, 3), Some(ret("d1", 2, 0, 0)))];
        let totals = aggregate(&pairs, &PlanBook::new(), Role::Field);
        assert_eq!(totals["w1"].degraded, vec![DegradeReason::NoPlan]);
        // 400.00 lands in the fallback 100..=500 bracket
        assert_eq!(totals["w1"].commission, Money::from_units(10));
    }

    #[test]
    fn test_multiple_employees_keyed_separately() {
        let pairs = vec![
            (dispatch("d1", "w1", 10, 5000, 3), Some(ret("d1", 2, 0, 0))),
            (dispatch("d2", "w2", 6, 5000, 3), Some(ret("d2", 0, 0, 0))),
        ];
        let totals = aggregate(&pairs, &book(), Role::Field);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["w2"].sold_amount, Money::from_units(300));
    }

    #[test]
    fn test_grand_totals() {
        let pairs = vec![
            (dispatch("d1", "w1", 10, 5000, 3), Some(ret("d1", 2, 0, 10_000))),
            (dispatch("d2", "w2", 6, 5000, 3), Some(ret("d2", 0, 0, 20_000))),
        ];
        let totals = aggregate(&pairs, &book(), Role::Field);
        let g = grand_totals(&totals);
        assert_eq!(g.sold_amount, Money::from_units(700));
        assert_eq!(g.cash_remit, Money::from_cents(30_000));
        assert_eq!(g.gross_sales, Money::from_units(800));
    }
}
