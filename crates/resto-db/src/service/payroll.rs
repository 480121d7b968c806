//! # Payroll Service
//!
//! Builds the monthly payroll run: one transaction from snapshot reads to
//! run persistence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  run_payroll(year, month, overwrite)                                    │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    existing run?  ──no overwrite──►  Conflict(existing)  (no writes)   │
//! │                   ──overwrite─────►  delete old run + lines            │
//! │    read employees, plans, dispatches+returns, deductions               │
//! │    aggregate commission  →  net per employee  →  insert run + lines    │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  A concurrent run that wins the race is detected by the                 │
//! │  (period_year, period_month) UNIQUE constraint; the loser maps the      │
//! │  violation back to Conflict instead of surfacing a raw DB error.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{deduction, dispatch, employee, payroll, plan};
use resto_core::aggregate;
use resto_core::payroll::{build_lines, period_range};
use resto_core::{EmployeeType, PayrollLine, PayrollRun, Role};

// =============================================================================
// Outcomes
// =============================================================================

/// A persisted run together with its lines.
#[derive(Debug, Clone)]
pub struct RunDetail {
    pub run: PayrollRun,
    pub lines: Vec<PayrollLine>,
}

/// What a `run_payroll` call did.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No run existed for the period; one was created.
    Created(RunDetail),
    /// A run existed and `overwrite` was set; it was replaced wholesale.
    Replaced(RunDetail),
    /// A run existed and `overwrite` was not set. Nothing was written.
    Conflict(PayrollRun),
}

impl RunOutcome {
    /// The run this outcome refers to, whichever way the call went.
    pub fn run(&self) -> &PayrollRun {
        match self {
            RunOutcome::Created(d) | RunOutcome::Replaced(d) => &d.run,
            RunOutcome::Conflict(run) => run,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Monthly payroll run builder.
#[derive(Debug, Clone)]
pub struct PayrollService {
    db: Database,
}

impl PayrollService {
    /// Creates a new PayrollService.
    pub fn new(db: Database) -> Self {
        PayrollService { db }
    }

    /// Builds and persists the payroll run for a calendar period.
    ///
    /// Gross pay is the period's commission (resolved per dispatch);
    /// deductions are the period's ledger sum. Only active FIELD staff are
    /// line candidates: dispatches recorded against anyone else earn no
    /// commission, and activity under ids outside that roster is skipped
    /// with a warning. An existing run blocks the call unless `overwrite`
    /// is set, in which case the old run and all its lines are replaced in
    /// the same transaction.
    pub async fn run_payroll(
        &self,
        year: i32,
        month: u32,
        overwrite: bool,
    ) -> DbResult<RunOutcome> {
        let (from, to) = period_range(year, month)?;

        let mut tx = self.db.pool().begin().await?;

        let replacing = match payroll::find_by_period(&mut tx, year, month).await? {
            Some(existing) if !overwrite => {
                info!(year, month, run_id = %existing.id, "Payroll run exists, not overwriting");
                return Ok(RunOutcome::Conflict(existing));
            }
            Some(existing) => {
                payroll::delete_run(&mut tx, &existing.id).await?;
                true
            }
            None => false,
        };

        // Snapshot reads: everything below sees one consistent state
        let field = employee::fetch_by_type(&mut tx, EmployeeType::Field).await?;
        let field_ids: BTreeSet<String> = field.iter().map(|e| e.id.clone()).collect();
        let book = plan::load_plan_book(&mut tx, &field, Role::Field).await?;
        let pairs = dispatch::fetch_with_returns(&mut tx, from, to, None).await?;
        let deductions = deduction::sum_by_employee(&mut tx, from, to).await?;

        // Only FIELD staff earn field commission; dispatches recorded
        // against anyone else are excluded before aggregation
        let field_pairs: Vec<_> = pairs
            .into_iter()
            .filter(|(d, _)| field_ids.contains(&d.waiter_id))
            .collect();

        let totals = aggregate::aggregate(&field_pairs, &book, Role::Field);
        let gross = totals
            .iter()
            .map(|(id, summary)| (id.clone(), summary.commission))
            .collect();

        let (drafts, skipped) = build_lines(&gross, &deductions, &field_ids);
        for id in &skipped {
            warn!(
                employee_id = %id,
                year,
                month,
                "Skipping payroll line for employee outside the field roster"
            );
        }

        let run = match payroll::insert_run_with_lines(&mut tx, year, month, &drafts).await {
            Ok(run) => run,
            Err(err) if err.is_conflict() => {
                // Lost a concurrent race on the period UNIQUE constraint
                drop(tx);
                let existing = self
                    .db
                    .payroll()
                    .get_by_period(year, month)
                    .await?
                    .ok_or(DbError::PayrollRunExists { year, month })?;
                return Ok(RunOutcome::Conflict(existing));
            }
            Err(err) => return Err(err),
        };

        let lines = payroll::fetch_lines(&mut tx, &run.id).await?;
        tx.commit().await?;

        info!(
            year,
            month,
            run_id = %run.id,
            lines = lines.len(),
            total_net_cents = run.total_net_cents,
            replacing,
            "Payroll run persisted"
        );

        let detail = RunDetail { run, lines };
        Ok(if replacing { RunOutcome::Replaced(detail) } else { RunOutcome::Created(detail) })
    }

    /// Fetches a persisted run with its lines.
    pub async fn get_payroll_run(&self, year: i32, month: u32) -> DbResult<Option<RunDetail>> {
        resto_core::validation::validate_period(year, month)?;

        let run = match self.db.payroll().get_by_period(year, month).await? {
            Some(run) => run,
            None => return Ok(None),
        };
        let lines = self.db.payroll().get_lines(&run.id).await?;
        Ok(Some(RunDetail { run, lines }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use resto_core::{DeductionReason, NewFieldReturn};

    const BRACKETS: &str =
        r#"[{"min":100,"max":500,"fixed":100},{"min":501,"max":750,"fixed":200}]"#;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn settle(qty_returned: i64, cash_cents: i64) -> NewFieldReturn {
        NewFieldReturn { qty_returned, loss_qty: 0, cash_collected_cents: cash_cents, note: None }
    }

    /// Default plan + one worker with a settled 400.00 dispatch
    /// (commission 100.00).
    async fn seed(db: &Database) -> String {
        let p = db.plans().create("Field default", Role::Field, BRACKETS).await.unwrap();
        db.plans().set_default(&p.id).await.unwrap();
        let w = db.employees().create("Asif", EmployeeType::Field, None).await.unwrap();
        let d = db
            .dispatches()
            .create_dispatch(&w.id, "samosa", 10, 5000, day(3))
            .await
            .unwrap();
        db.dispatches().create_return(&d.id, settle(2, 40_000)).await.unwrap();
        w.id
    }

    #[tokio::test]
    async fn test_run_created_with_commission_gross() {
        let db = db().await;
        let waiter = seed(&db).await;

        let outcome = db.payroll_service().run_payroll(2025, 11, false).await.unwrap();
        let detail = match outcome {
            RunOutcome::Created(d) => d,
            other => panic!("expected Created, got {other:?}"),
        };

        assert_eq!(detail.run.period_year, 2025);
        assert_eq!(detail.run.period_month, 11);
        assert_eq!(detail.lines.len(), 1);
        let line = &detail.lines[0];
        assert_eq!(line.employee_id, waiter);
        assert_eq!(line.gross_cents, 10_000);
        assert_eq!(line.net_pay_cents, 10_000);
        assert_eq!(line.carry_forward_cents, 0);
        assert_eq!(detail.run.total_net_cents, 10_000);
    }

    #[tokio::test]
    async fn test_second_run_conflicts_without_overwrite() {
        let db = db().await;
        seed(&db).await;
        let svc = db.payroll_service();

        let first = svc.run_payroll(2025, 11, false).await.unwrap();
        let outcome = svc.run_payroll(2025, 11, false).await.unwrap();

        match outcome {
            RunOutcome::Conflict(existing) => assert_eq!(existing.id, first.run().id),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_overwrite_replaces_run_and_lines() {
        let db = db().await;
        let waiter = seed(&db).await;
        let svc = db.payroll_service();

        let first = svc.run_payroll(2025, 11, false).await.unwrap();
        let first_id = first.run().id.clone();

        // New activity after the first run: another 400.00 dispatch
        let d = db
            .dispatches()
            .create_dispatch(&waiter, "samosa", 10, 5000, day(20))
            .await
            .unwrap();
        db.dispatches().create_return(&d.id, settle(2, 0)).await.unwrap();

        let outcome = svc.run_payroll(2025, 11, true).await.unwrap();
        let detail = match outcome {
            RunOutcome::Replaced(d) => d,
            other => panic!("expected Replaced, got {other:?}"),
        };

        assert_ne!(detail.run.id, first_id);
        // Per-dispatch resolution: 100 + 100, not a lookup on the 800 total
        assert_eq!(detail.run.total_gross_cents, 20_000);

        // The old run's lines are gone with it
        let orphaned = db.payroll().get_lines(&first_id).await.unwrap();
        assert!(orphaned.is_empty());
        assert_eq!(db.payroll().list_runs().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_month_creates_empty_run() {
        let db = db().await;
        let outcome = db.payroll_service().run_payroll(2025, 7, false).await.unwrap();
        let detail = match outcome {
            RunOutcome::Created(d) => d,
            other => panic!("expected Created, got {other:?}"),
        };
        assert!(detail.lines.is_empty());
        assert_eq!(detail.run.total_net_cents, 0);
    }

    #[tokio::test]
    async fn test_deduction_only_employee_gets_carry_forward_line() {
        let db = db().await;
        seed(&db).await;
        let other = db.employees().create("Bilal", EmployeeType::Field, None).await.unwrap();
        db.deductions()
            .record(&other.id, 7_500, DeductionReason::Advance, day(10), None)
            .await
            .unwrap();

        let outcome = db.payroll_service().run_payroll(2025, 11, false).await.unwrap();
        let detail = match outcome {
            RunOutcome::Created(d) => d,
            other => panic!("expected Created, got {other:?}"),
        };

        assert_eq!(detail.lines.len(), 2);
        let line = detail.lines.iter().find(|l| l.employee_id == other.id).unwrap();
        assert_eq!(line.gross_cents, 0);
        assert_eq!(line.net_pay_cents, 0);
        assert_eq!(line.carry_forward_cents, 7_500);
    }

    #[tokio::test]
    async fn test_non_field_staff_earn_no_commission_or_line() {
        let db = db().await;
        let waiter = seed(&db).await;

        // A settled dispatch recorded against kitchen staff must not earn
        // field commission, and a kitchen deduction gets no line either
        let cook = db.employees().create("Cook", EmployeeType::Kitchen, None).await.unwrap();
        let d = db
            .dispatches()
            .create_dispatch(&cook.id, "samosa", 10, 5000, day(8))
            .await
            .unwrap();
        db.dispatches().create_return(&d.id, settle(2, 40_000)).await.unwrap();
        db.deductions()
            .record(&cook.id, 2_000, DeductionReason::Breakage, day(9), None)
            .await
            .unwrap();

        let outcome = db.payroll_service().run_payroll(2025, 11, false).await.unwrap();
        let detail = match outcome {
            RunOutcome::Created(d) => d,
            other => panic!("expected Created, got {other:?}"),
        };

        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].employee_id, waiter);
        assert!(detail.lines.iter().all(|l| l.employee_id != cook.id));
        // Run totals only carry the field worker's commission
        assert_eq!(detail.run.total_gross_cents, 10_000);
        assert_eq!(detail.run.total_deductions_cents, 0);
    }

    #[tokio::test]
    async fn test_deductions_net_against_commission() {
        let db = db().await;
        let waiter = seed(&db).await;
        db.deductions()
            .record(&waiter, 3_000, DeductionReason::Breakage, day(10), None)
            .await
            .unwrap();

        let outcome = db.payroll_service().run_payroll(2025, 11, false).await.unwrap();
        let line = match &outcome {
            RunOutcome::Created(d) => &d.lines[0],
            other => panic!("expected Created, got {other:?}"),
        };

        assert_eq!(line.gross_cents, 10_000);
        assert_eq!(line.deductions_applied_cents, 3_000);
        assert_eq!(line.net_pay_cents, 7_000);
        assert_eq!(line.carry_forward_cents, 0);
    }

    #[tokio::test]
    async fn test_deductions_outside_period_excluded() {
        let db = db().await;
        let waiter = seed(&db).await;
        db.deductions()
            .record(
                &waiter,
                3_000,
                DeductionReason::Advance,
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                None,
            )
            .await
            .unwrap();

        let outcome = db.payroll_service().run_payroll(2025, 11, false).await.unwrap();
        let line = match &outcome {
            RunOutcome::Created(d) => &d.lines[0],
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(line.deductions_applied_cents, 0);
        assert_eq!(line.net_pay_cents, 10_000);
    }

    #[tokio::test]
    async fn test_invalid_period_rejected() {
        let db = db().await;
        let err = db.payroll_service().run_payroll(2025, 13, false).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_payroll_run() {
        let db = db().await;
        seed(&db).await;
        let svc = db.payroll_service();

        assert!(svc.get_payroll_run(2025, 11).await.unwrap().is_none());
        svc.run_payroll(2025, 11, false).await.unwrap();

        let detail = svc.get_payroll_run(2025, 11).await.unwrap().unwrap();
        assert_eq!(detail.lines.len(), 1);
    }
}
