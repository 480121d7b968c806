//! # Commission Service
//!
//! Commission previews and the idempotent per-dispatch commission snapshot.
//!
//! ## Preview vs Apply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  preview_commission(employee, date):                                    │
//! │      read that day's settled dispatches + plans → figures DTO          │
//! │      (no writes, safe to call any time)                                │
//! │                                                                         │
//! │  apply_commission(dispatch):                                            │
//! │      reconcile + resolve → upsert dispatch_commissions                 │
//! │      (recompute and overwrite; applying twice leaves the same row)     │
//! │                                                                         │
//! │  commission_report(from, to):                                           │
//! │      the same aggregation over a date window, per employee             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields in the DTOs are 2-decimal strings: these are boundary
//! artifacts, and strings keep consumers from re-doing float math on rounded
//! figures.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{dispatch, employee, plan};
use resto_core::aggregate::{self, CommissionTotals, EmployeeSummary};
use resto_core::commission::{self, DegradeReason};
use resto_core::{bracket, reconcile, EmployeeType, Money, Role};

// =============================================================================
// DTOs
// =============================================================================

/// The next bracket an employee has not yet reached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTarget {
    /// Sold amount needed to enter the bracket, as a 2-decimal string.
    pub threshold: String,
    /// What the bracket pays, as a 2-decimal string.
    pub commission: String,
}

/// One employee's commission figures for a single day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionPreview {
    pub employee_id: String,
    pub employee_name: String,
    pub date: NaiveDate,
    /// Sold amount over the day's settled dispatches.
    pub daily_sales: String,
    pub cash_collected: String,
    pub commission: String,
    /// Non-empty when any figure came from the static fallback table.
    pub degraded: Vec<DegradeReason>,
    /// Absent when the day's sales are already past every bracket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_target: Option<NextTarget>,
}

/// One employee's row in a commission report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRow {
    pub employee_id: String,
    pub employee_name: String,
    pub sold_amount: String,
    pub commission: String,
    pub cash_remit: String,
    pub gross_sales: String,
    pub active_days: usize,
    pub degraded: Vec<DegradeReason>,
}

/// A commission report over a date window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<CommissionRow>,
    pub total_sold_amount: String,
    pub total_commission: String,
    pub total_cash_remit: String,
    pub total_gross_sales: String,
}

// =============================================================================
// Service
// =============================================================================

/// Commission preview and snapshot operations.
#[derive(Debug, Clone)]
pub struct CommissionService {
    db: Database,
}

impl CommissionService {
    /// Creates a new CommissionService.
    pub fn new(db: Database) -> Self {
        CommissionService { db }
    }

    /// Computes one employee's commission figures for a single day.
    ///
    /// Pending dispatches contribute nothing; a day with no settled
    /// dispatches previews as all-zero with the first bracket as the next
    /// target. Pure read.
    pub async fn preview_commission(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> DbResult<CommissionPreview> {
        let emp = self
            .db
            .employees()
            .get_by_id(employee_id)
            .await?
            .ok_or_else(|| DbError::not_found("Employee", employee_id))?;

        let mut conn = self.db.pool().acquire().await?;
        let book = plan::load_plan_book(&mut conn, std::slice::from_ref(&emp), Role::Field).await?;
        let pairs = dispatch::fetch_with_returns(&mut conn, date, date, Some(employee_id)).await?;
        drop(conn);

        let totals = aggregate::aggregate(&pairs, &book, Role::Field);
        let summary = totals.get(employee_id).cloned().unwrap_or_default();

        let brackets = commission::brackets_for_employee(&book, employee_id, Role::Field);
        let next_target = bracket::next_target(&brackets, summary.sold_amount).map(into_target);

        debug!(
            employee = %employee_id,
            %date,
            sold_cents = summary.sold_amount.cents(),
            commission_cents = summary.commission.cents(),
            "Commission preview computed"
        );

        Ok(CommissionPreview {
            employee_id: emp.id,
            employee_name: emp.name,
            date,
            daily_sales: summary.sold_amount.to_decimal_string(),
            cash_collected: summary.cash_remit.to_decimal_string(),
            commission: summary.commission.to_decimal_string(),
            degraded: summary.degraded,
            next_target,
        })
    }

    /// Recomputes and stores the commission snapshot for one settled
    /// dispatch. Returns the stored commission, or `None` when the dispatch
    /// is still pending (nothing to snapshot yet).
    ///
    /// Idempotent by construction: the row is derived solely from the
    /// dispatch, its return, and the current plans, and the upsert replaces
    /// the previous snapshot instead of accumulating.
    pub async fn apply_commission(&self, dispatch_id: &str) -> DbResult<Option<Money>> {
        let dsp = self
            .db
            .dispatches()
            .get_by_id(dispatch_id)
            .await?
            .ok_or_else(|| DbError::not_found("Dispatch", dispatch_id))?;

        let ret = match self.db.dispatches().get_return(dispatch_id).await? {
            Some(r) => r,
            None => {
                debug!(dispatch = %dispatch_id, "Dispatch pending, no commission to apply");
                return Ok(None);
            }
        };

        let emp = self
            .db
            .employees()
            .get_by_id(&dsp.waiter_id)
            .await?
            .ok_or_else(|| DbError::not_found("Employee", &dsp.waiter_id))?;

        let mut conn = self.db.pool().acquire().await?;
        let book = plan::load_plan_book(&mut conn, std::slice::from_ref(&emp), Role::Field).await?;

        let settlement = reconcile::reconcile(&dsp, &ret);
        let resolution = commission::resolve_for_employee(
            &book,
            &dsp.waiter_id,
            Role::Field,
            settlement.sold_amount,
        );

        sqlx::query(
            r#"
            INSERT INTO dispatch_commissions (
                dispatch_id, sold_amount_cents, commission_cents, computed_at
            ) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (dispatch_id) DO UPDATE SET
                sold_amount_cents = excluded.sold_amount_cents,
                commission_cents = excluded.commission_cents,
                computed_at = excluded.computed_at
            "#,
        )
        .bind(&dsp.id)
        .bind(settlement.sold_amount.cents())
        .bind(resolution.commission.cents())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        info!(
            dispatch = %dispatch_id,
            sold_cents = settlement.sold_amount.cents(),
            commission_cents = resolution.commission.cents(),
            "Commission snapshot applied"
        );
        Ok(Some(resolution.commission))
    }

    /// Builds a per-employee commission report over `[from, to]`, optionally
    /// for a single field worker. Pure read.
    pub async fn commission_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        waiter_id: Option<&str>,
    ) -> DbResult<CommissionReport> {
        let mut conn = self.db.pool().acquire().await?;

        let employees = employee::fetch_by_type(&mut conn, EmployeeType::Field).await?;
        let book = plan::load_plan_book(&mut conn, &employees, Role::Field).await?;
        let pairs = dispatch::fetch_with_returns(&mut conn, from, to, waiter_id).await?;
        drop(conn);

        // Field roster only: dispatches recorded against other staff types
        // never earn field commission
        let field_pairs: Vec<_> = pairs
            .into_iter()
            .filter(|(d, _)| employees.iter().any(|e| e.id == d.waiter_id))
            .collect();

        let totals = aggregate::aggregate(&field_pairs, &book, Role::Field);
        debug!(
            employees = totals.len(),
            dispatches = field_pairs.len(),
            "Commission report aggregated"
        );

        Ok(build_report(from, to, &totals, &employees))
    }
}

// =============================================================================
// Report Assembly
// =============================================================================

fn into_target((threshold, fixed): (Money, Money)) -> NextTarget {
    NextTarget {
        threshold: threshold.to_decimal_string(),
        commission: fixed.to_decimal_string(),
    }
}

fn build_report(
    from: NaiveDate,
    to: NaiveDate,
    totals: &CommissionTotals,
    employees: &[resto_core::Employee],
) -> CommissionReport {
    let rows = totals
        .iter()
        .map(|(employee_id, summary)| row_for(employee_id, summary, employees))
        .collect();

    let grand = aggregate::grand_totals(totals);

    CommissionReport {
        from,
        to,
        rows,
        total_sold_amount: grand.sold_amount.to_decimal_string(),
        total_commission: grand.commission.to_decimal_string(),
        total_cash_remit: grand.cash_remit.to_decimal_string(),
        total_gross_sales: grand.gross_sales.to_decimal_string(),
    }
}

fn row_for(
    employee_id: &str,
    summary: &EmployeeSummary,
    employees: &[resto_core::Employee],
) -> CommissionRow {
    let name = employees
        .iter()
        .find(|e| e.id == employee_id)
        .map(|e| e.name.clone())
        .unwrap_or_default();

    CommissionRow {
        employee_id: employee_id.to_string(),
        employee_name: name,
        sold_amount: summary.sold_amount.to_decimal_string(),
        commission: summary.commission.to_decimal_string(),
        cash_remit: summary.cash_remit.to_decimal_string(),
        gross_sales: summary.gross_sales.to_decimal_string(),
        active_days: summary.active_days,
        degraded: summary.degraded.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
