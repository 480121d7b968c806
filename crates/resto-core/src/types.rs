//! # Domain Types
//!
//! Core domain types used throughout the back office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Employee     │   │  FieldDispatch  │   │   FieldReturn   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  dispatch_id    │       │
//! │  │  employee_type  │   │  waiter_id      │   │  qty_returned   │       │
//! │  │  plan id?       │   │  qty_dispatched │   │  loss_qty       │       │
//! │  └─────────────────┘   │  price_each     │   │  cash_collected │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CommissionPlan  │   │   PayrollRun    │   │   PayrollLine   │       │
//! │  │  role, default  │   │  (year, month)  │   │  gross, net,    │       │
//! │  │  brackets JSON  │   │  unique         │   │  carry_forward  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A dispatch is a two-state machine: "pending" (no return row) until its
//! paired return is created, then "settled" forever. There is no way back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Roles
// =============================================================================

/// Commission role a plan is scoped to.
///
/// Kitchen staff earn no commission, so only these two roles carry plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Works the floor inside the restaurant.
    Inside,
    /// Takes stock out on field dispatch routes.
    Field,
}

/// Employment type of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum EmployeeType {
    Inside,
    Field,
    Kitchen,
}

impl EmployeeType {
    /// The commission role for this employment type, if any.
    pub fn commission_role(&self) -> Option<Role> {
        match self {
            EmployeeType::Inside => Some(Role::Inside),
            EmployeeType::Field => Some(Role::Field),
            EmployeeType::Kitchen => None,
        }
    }
}

// =============================================================================
// Employee
// =============================================================================

/// An employee record, consumed read-only by the payout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Employment type (INSIDE / FIELD / KITCHEN).
    pub employee_type: EmployeeType,

    /// Explicitly assigned commission plan, if any.
    /// Absent, the role's default plan applies.
    pub commission_plan_id: Option<String>,

    /// Whether the employee is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Commission Plan
// =============================================================================

/// A role-scoped ordered list of commission brackets.
///
/// At most one plan per role carries `is_default = true` at any time;
/// assigning a new default atomically clears the previous one (enforced in
/// the persistence layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CommissionPlan {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub is_default: bool,
    /// Raw bracket list as stored (JSON text). Parsed leniently via
    /// `bracket::parse_brackets` at resolution time.
    pub brackets_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Field Dispatch & Return
// =============================================================================

/// Stock handed to a field worker. Created once; immutable thereafter
/// except via its paired return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FieldDispatch {
    pub id: String,
    /// Employee the stock was dispatched to.
    pub waiter_id: String,
    pub item_id: String,
    pub qty_dispatched: i64,
    /// Unit price in cents at dispatch time.
    pub price_each_cents: i64,
    /// Business date of the dispatch (drives active-day counting).
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl FieldDispatch {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price_each(&self) -> Money {
        Money::from_cents(self.price_each_cents)
    }

    /// Full dispatched value: qty_dispatched × price_each.
    #[inline]
    pub fn gross_sales(&self) -> Money {
        self.price_each().multiply_quantity(self.qty_dispatched)
    }
}

/// The settlement record for a dispatch. At most one per dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FieldReturn {
    pub id: String,
    pub dispatch_id: String,
    pub qty_returned: i64,
    pub loss_qty: i64,
    /// Cash physically handed in, in cents. Never exceeds sold amount.
    pub cash_collected_cents: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FieldReturn {
    #[inline]
    pub fn cash_collected(&self) -> Money {
        Money::from_cents(self.cash_collected_cents)
    }
}

/// Fields supplied by the caller when settling a dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFieldReturn {
    pub qty_returned: i64,
    pub loss_qty: i64,
    pub cash_collected_cents: i64,
    pub note: Option<String>,
}

// =============================================================================
// Salary Deductions
// =============================================================================

/// Why a deduction was recorded against an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum DeductionReason {
    /// Salary advance paid out early.
    Advance,
    /// Broken crockery/equipment charged back.
    Breakage,
    /// Stock loss charged back.
    Loss,
    Other,
}

/// An append-only ledger entry. Scoped to a payroll period by date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalaryDeduction {
    pub id: String,
    pub employee_id: String,
    pub amount_cents: i64,
    pub reason: DeductionReason,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SalaryDeduction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Payroll Run & Lines
// =============================================================================

/// An immutable, period-keyed snapshot of all employees' net pay.
///
/// Unique per `(period_year, period_month)`. May be deleted-and-recreated
/// wholesale (overwrite), never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PayrollRun {
    pub id: String,
    pub period_year: i32,
    pub period_month: u32,
    pub run_at: DateTime<Utc>,
    /// Sum of line gross figures, in cents.
    pub total_gross_cents: i64,
    /// Sum of line deduction figures, in cents.
    pub total_deductions_cents: i64,
    /// Sum of line net figures, in cents.
    pub total_net_cents: i64,
}

/// One payroll line per employee with activity in the period.
///
/// `carry_forward` and `net_pay` are mutually exclusive by construction:
/// exactly one of them can be non-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PayrollLine {
    pub id: String,
    pub payroll_run_id: String,
    pub employee_id: String,
    pub gross_cents: i64,
    pub deductions_applied_cents: i64,
    pub carry_forward_cents: i64,
    pub net_pay_cents: i64,
    pub note: Option<String>,
}

impl PayrollLine {
    #[inline]
    pub fn gross(&self) -> Money {
        Money::from_cents(self.gross_cents)
    }

    #[inline]
    pub fn net_pay(&self) -> Money {
        Money::from_cents(self.net_pay_cents)
    }

    #[inline]
    pub fn carry_forward(&self) -> Money {
        Money::from_cents(self.carry_forward_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dispatch(qty: i64, price_cents: i64) -> FieldDispatch {
        FieldDispatch {
            id: "d1".to_string(),
            waiter_id: "w1".to_string(),
            item_id: "i1".to_string(),
            qty_dispatched: qty,
            price_each_cents: price_cents,
            date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_gross_sales() {
        let d = dispatch(10, 5000);
        assert_eq!(d.gross_sales().cents(), 50_000);
    }

    #[test]
    fn test_commission_role() {
        assert_eq!(EmployeeType::Inside.commission_role(), Some(Role::Inside));
        assert_eq!(EmployeeType::Field.commission_role(), Some(Role::Field));
        assert_eq!(EmployeeType::Kitchen.commission_role(), None);
    }

    #[test]
    fn test_role_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Field).unwrap(), "\"FIELD\"");
        let r: Role = serde_json::from_str("\"INSIDE\"").unwrap();
        assert_eq!(r, Role::Inside);
    }
}
