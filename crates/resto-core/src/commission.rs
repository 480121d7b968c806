//! # Commission Resolver
//!
//! Resolves the commission payable for a monetary amount via the fallback
//! chain:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Resolution order for employee E with role R                            │
//! │                                                                         │
//! │  1. E's explicitly assigned plan    (if set and non-empty)             │
//! │  2. R's default plan                (if set and non-empty)             │
//! │  3. Static fallback table for R     (safety net; marks the result      │
//! │                                      Degraded for observability)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed bracket data never makes resolution throw: entries are coerced
//! or dropped at the parse boundary, and a plan left with no usable brackets
//! just falls through the chain. Only the plan-lookup storage itself failing
//! is an error, and that surfaces in resto-db before this module runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bracket::{self, Bracket};
use crate::money::Money;
use crate::types::{CommissionPlan, Role};

// =============================================================================
// Static Fallback Tables
// =============================================================================

/// Safety-net bracket table for INSIDE staff, used when the database plan is
/// empty or corrupt. Amounts in cents.
const FALLBACK_INSIDE: [Bracket; 3] = [
    Bracket::new(Money::from_units(100), Money::from_units(500), Money::from_units(5)),
    Bracket::new(Money::from_units(501), Money::from_units(1_000), Money::from_units(12)),
    Bracket::new(Money::from_units(1_001), Money::from_units(5_000), Money::from_units(30)),
];

/// Safety-net bracket table for FIELD staff.
const FALLBACK_FIELD: [Bracket; 3] = [
    Bracket::new(Money::from_units(100), Money::from_units(500), Money::from_units(10)),
    Bracket::new(Money::from_units(501), Money::from_units(1_000), Money::from_units(25)),
    Bracket::new(Money::from_units(1_001), Money::from_units(5_000), Money::from_units(60)),
];

/// The static fallback bracket table for a role.
pub fn fallback_brackets(role: Role) -> &'static [Bracket] {
    match role {
        Role::Inside => &FALLBACK_INSIDE,
        Role::Field => &FALLBACK_FIELD,
    }
}

// =============================================================================
// Resolution Result
// =============================================================================

/// Why a resolution fell back to the static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// Neither an assigned plan nor a role default existed.
    NoPlan,
    /// A plan existed but parsed to zero usable brackets.
    EmptyPlan,
}

/// The outcome of a commission resolution.
///
/// A degraded resolution still yields a commission (from the static
/// fallback table), but carries the reason so aggregation can report which
/// employees resolved degraded instead of silently zeroing them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub commission: Money,
    pub degraded: Option<DegradeReason>,
}

impl Resolution {
    fn clean(commission: Money) -> Self {
        Resolution { commission, degraded: None }
    }

    fn degraded(commission: Money, reason: DegradeReason) -> Self {
        Resolution { commission, degraded: Some(reason) }
    }
}

// =============================================================================
// Plan Book
// =============================================================================

/// A consistent snapshot of commission plans, preloaded per call.
///
/// The resolver never does I/O; callers load whatever plans the run needs
/// (assigned plans by employee, defaults by role) into a `PlanBook` first,
/// inside the same transaction as the rest of the run's reads.
#[derive(Debug, Default, Clone)]
pub struct PlanBook {
    /// Assigned plan per employee id.
    assigned: HashMap<String, CommissionPlan>,
    /// Default plan per role.
    defaults: HashMap<Role, CommissionPlan>,
}

impl PlanBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_assigned(&mut self, employee_id: impl Into<String>, plan: CommissionPlan) {
        self.assigned.insert(employee_id.into(), plan);
    }

    pub fn insert_default(&mut self, plan: CommissionPlan) {
        self.defaults.insert(plan.role, plan);
    }

    pub fn assigned_plan(&self, employee_id: &str) -> Option<&CommissionPlan> {
        self.assigned.get(employee_id)
    }

    pub fn default_plan(&self, role: Role) -> Option<&CommissionPlan> {
        self.defaults.get(&role)
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves commission for a single plan and amount.
///
/// Pure and idempotent: the same plan + amount always yields the same
/// result. `None` or a plan with no usable brackets falls back to the
/// static table for `role` and marks the result degraded.
pub fn resolve_commission(plan: Option<&CommissionPlan>, role: Role, amount: Money) -> Resolution {
    match plan {
        Some(p) => {
            let brackets = bracket::parse_brackets_str(&p.brackets_json);
            if brackets.is_empty() {
                let commission = bracket::lookup(fallback_brackets(role), amount);
                Resolution::degraded(commission, DegradeReason::EmptyPlan)
            } else {
                Resolution::clean(bracket::lookup(&brackets, amount))
            }
        }
        None => {
            let commission = bracket::lookup(fallback_brackets(role), amount);
            Resolution::degraded(commission, DegradeReason::NoPlan)
        }
    }
}

/// Resolves commission for an employee through the full fallback chain.
///
/// The assigned plan is only used when it has usable brackets; an assigned
/// plan that parses empty falls through to the role default, and only when
/// that is also unusable does the static table engage.
pub fn resolve_for_employee(
    book: &PlanBook,
    employee_id: &str,
    role: Role,
    amount: Money,
) -> Resolution {
    // (1) explicitly assigned plan, if it has usable brackets
    if let Some(plan) = book.assigned_plan(employee_id) {
        let brackets = bracket::parse_brackets_str(&plan.brackets_json);
        if !brackets.is_empty() {
            return Resolution::clean(bracket::lookup(&brackets, amount));
        }
    }

    // (2) role default plan
    if let Some(plan) = book.default_plan(role) {
        let brackets = bracket::parse_brackets_str(&plan.brackets_json);
        if !brackets.is_empty() {
            return Resolution::clean(bracket::lookup(&brackets, amount));
        }
        // A default existed but was unusable
        return Resolution::degraded(
            bracket::lookup(fallback_brackets(role), amount),
            DegradeReason::EmptyPlan,
        );
    }

    // (3) static fallback table
    Resolution::degraded(
        bracket::lookup(fallback_brackets(role), amount),
        DegradeReason::NoPlan,
    )
}

/// The bracket list the employee would resolve against, for previews.
///
/// Follows the same chain as [`resolve_for_employee`] so the "next target"
/// shown on a dashboard matches the brackets that will actually pay out.
pub fn brackets_for_employee(book: &PlanBook, employee_id: &str, role: Role) -> Vec<Bracket> {
    if let Some(plan) = book.assigned_plan(employee_id) {
        let brackets = bracket::parse_brackets_str(&plan.brackets_json);
        if !brackets.is_empty() {
            return brackets;
        }
    }
    if let Some(plan) = book.default_plan(role) {
        let brackets = bracket::parse_brackets_str(&plan.brackets_json);
        if !brackets.is_empty() {
            return brackets;
        }
    }
    fallback_brackets(role).to_vec()
}

// =============================================================================
// Unit Tests
// =============================================================================
