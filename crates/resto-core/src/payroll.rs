//! # Payroll Line Math
//!
//! Pure half of the payroll run builder: period resolution and the
//! gross-vs-deductions netting per employee. The transactional half
//! (snapshot reads, run persistence, overwrite semantics) lives in
//! resto-db's payroll service.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per employee in the period:                                            │
//! │                                                                         │
//! │    carry_forward = max(0, deductions − gross)                          │
//! │    net_pay       = max(0, gross − deductions)                          │
//! │                                                                         │
//! │  Exactly one of the two is non-zero (or both zero): the netting is      │
//! │  mutually exclusive by construction.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::validate_period;

// =============================================================================
// Period Resolution
// =============================================================================

/// First through last calendar day of the month, both inclusive.
///
/// Local-calendar arithmetic on `NaiveDate`, deliberately not UTC month
/// boundaries, which drift a day at month edges in non-UTC deployments.
pub fn period_range(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    validate_period(year, month)?;

    // Both unwraps are guarded by validate_period
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(ValidationError::InvalidPeriod { year, month })?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(ValidationError::InvalidPeriod { year, month })?;
    let last = next_first.pred_opt().ok_or(ValidationError::InvalidPeriod { year, month })?;

    Ok((first, last))
}

// =============================================================================
// Line Drafts
// =============================================================================

/// An unpersisted payroll line: the pure output of the netting step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    pub employee_id: String,
    pub gross: Money,
    pub deductions_applied: Money,
    pub carry_forward: Money,
    pub net_pay: Money,
}

impl LineDraft {
    /// Nets gross commission against period deductions for one employee.
    pub fn net(employee_id: String, gross: Money, deductions: Money) -> Self {
        LineDraft {
            employee_id,
            gross,
            deductions_applied: deductions,
            carry_forward: deductions.saturating_sub_zero(gross),
            net_pay: gross.saturating_sub_zero(deductions),
        }
    }
}

/// Builds payroll line drafts from per-employee gross and deduction sums.
///
/// The employee-id sets from both sources are unioned: an employee with
/// only deductions still gets a line (pure carry-forward), an employee with
/// only commission gets a line with zero deductions. `known_employees`
/// filters out ids that no longer resolve (deleted employees); those are
/// skipped rather than failing the run, and the caller logs them.
///
/// Returns the drafts in employee-id order plus the skipped ids.
pub fn build_lines(
    gross_by_employee: &BTreeMap<String, Money>,
    deductions_by_employee: &BTreeMap<String, Money>,
    known_employees: &BTreeSet<String>,
) -> (Vec<LineDraft>, Vec<String>) {
    let mut ids: BTreeSet<&String> = BTreeSet::new();
    ids.extend(gross_by_employee.keys());
    ids.extend(deductions_by_employee.keys());

    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    for id in ids {
        if !known_employees.contains(id) {
            skipped.push(id.clone());
            continue;
        }
        let gross = gross_by_employee.get(id).copied().unwrap_or_default();
        let deductions = deductions_by_employee.get(id).copied().unwrap_or_default();
        lines.push(LineDraft::net(id.clone(), gross, deductions));
    }

    (lines, skipped)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn money_map(pairs: &[(&str, i64)]) -> BTreeMap<String, Money> {
        pairs
            .iter()
            .map(|(id, cents)| (id.to_string(), Money::from_cents(*cents)))
            .collect()
    }

    fn ids(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_period_range_regular_month() {
        let (first, last) = period_range(2025, 11).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 11, 30).unwrap());
    }

    #[test]
    fn test_period_range_december_wraps_year() {
        let (first, last) = period_range(2025, 12).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_period_range_leap_february() {
        let (_, last) = period_range(2024, 2).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = period_range(2025, 2).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn test_period_range_invalid() {
        assert!(period_range(2025, 13).is_err());
        assert!(period_range(2025, 0).is_err());
    }

    #[test]
    fn test_net_pay_when_gross_exceeds_deductions() {
        let line = LineDraft::net("e1".to_string(), Money::from_cents(5000), Money::from_cents(2000));
        assert_eq!(line.net_pay.cents(), 3000);
        assert_eq!(line.carry_forward.cents(), 0);
    }

    #[test]
    fn test_carry_forward_when_deductions_exceed_gross() {
        let line = LineDraft::net("e1".to_string(), Money::from_cents(2000), Money::from_cents(5000));
        assert_eq!(line.net_pay.cents(), 0);
        assert_eq!(line.carry_forward.cents(), 3000);
    }

    #[test]
    fn test_line_exclusivity_property() {
        // For any gross/deductions, never both sides positive
        for (gross, ded) in [(0, 0), (100, 100), (500, 200), (200, 500), (0, 300), (300, 0)] {
            let line =
                LineDraft::net("e".to_string(), Money::from_cents(gross), Money::from_cents(ded));
            assert!(
                line.carry_forward.is_zero() || line.net_pay.is_zero(),
                "both positive for gross={gross} ded={ded}"
            );
        }
    }

    #[test]
    fn test_build_lines_unions_both_sources() {
        let gross = money_map(&[("a", 5000), ("b", 3000)]);
        let ded = money_map(&[("b", 1000), ("c", 2000)]);
        let (lines, skipped) = build_lines(&gross, &ded, &ids(&["a", "b", "c"]));

        assert!(skipped.is_empty());
        assert_eq!(lines.len(), 3);
        // Deterministic employee-id order
        assert_eq!(lines[0].employee_id, "a");
        assert_eq!(lines[0].net_pay.cents(), 5000);
        assert_eq!(lines[1].net_pay.cents(), 2000);
        // c: deductions only → pure carry-forward
        assert_eq!(lines[2].net_pay.cents(), 0);
        assert_eq!(lines[2].carry_forward.cents(), 2000);
    }

    #[test]
    fn test_build_lines_skips_unknown_employees() {
        let gross = money_map(&[("a", 5000), ("ghost", 1000)]);
        let ded = money_map(&[]);
        let (lines, skipped) = build_lines(&gross, &ded, &ids(&["a"]));

        assert_eq!(lines.len(), 1);
        assert_eq!(skipped, vec!["ghost".to_string()]);
    }

    #[test]
    fn test_build_lines_empty_inputs() {
        let (lines, skipped) = build_lines(&BTreeMap::new(), &BTreeMap::new(), &BTreeSet::new());
        assert!(lines.is_empty());
        assert!(skipped.is_empty());
    }
}
