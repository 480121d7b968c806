//! # Payroll Repository
//!
//! Persistence for payroll runs and their lines.
//!
//! A run is written whole and replaced whole; every write helper here takes
//! the caller's connection so the payroll service can build the entire run
//! inside one transaction. The `(period_year, period_month)` UNIQUE
//! constraint arbitrates concurrent run attempts.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use resto_core::payroll::LineDraft;
use resto_core::{PayrollLine, PayrollRun};

/// Repository for payroll run reads.
#[derive(Debug, Clone)]
pub struct PayrollRepository {
    pool: SqlitePool,
}

impl PayrollRepository {
    /// Creates a new PayrollRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PayrollRepository { pool }
    }

    /// Gets the run for a period, if one exists.
    pub async fn get_by_period(&self, year: i32, month: u32) -> DbResult<Option<PayrollRun>> {
        let mut conn = self.pool.acquire().await?;
        find_by_period(&mut conn, year, month).await
    }

    /// Gets the lines of a run, ordered by employee.
    pub async fn get_lines(&self, run_id: &str) -> DbResult<Vec<PayrollLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lines(&mut conn, run_id).await
    }

    /// Lists all runs, newest period first.
    pub async fn list_runs(&self) -> DbResult<Vec<PayrollRun>> {
        let runs = sqlx::query_as::<_, PayrollRun>(
            "SELECT id, period_year, period_month, run_at, total_gross_cents, \
             total_deductions_cents, total_net_cents \
             FROM payroll_runs ORDER BY period_year DESC, period_month DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(runs)
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Finds the run for a period on an existing connection.
pub(crate) async fn find_by_period(
    conn: &mut SqliteConnection,
    year: i32,
    month: u32,
) -> DbResult<Option<PayrollRun>> {
    let run = sqlx::query_as::<_, PayrollRun>(
        "SELECT id, period_year, period_month, run_at, total_gross_cents, \
         total_deductions_cents, total_net_cents \
         FROM payroll_runs WHERE period_year = ?1 AND period_month = ?2",
    )
    .bind(year)
    .bind(month)
    .fetch_optional(conn)
    .await?;

    Ok(run)
}

/// Fetches a run's lines on an existing connection.
pub(crate) async fn fetch_lines(
    conn: &mut SqliteConnection,
    run_id: &str,
) -> DbResult<Vec<PayrollLine>> {
    let lines = sqlx::query_as::<_, PayrollLine>(
        "SELECT id, payroll_run_id, employee_id, gross_cents, deductions_applied_cents, \
         carry_forward_cents, net_pay_cents, note \
         FROM payroll_lines WHERE payroll_run_id = ?1 ORDER BY employee_id",
    )
    .bind(run_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Deletes a run and, via cascade, its lines. Used only by overwrite.
pub(crate) async fn delete_run(conn: &mut SqliteConnection, run_id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM payroll_runs WHERE id = ?1")
        .bind(run_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Inserts a run and all its lines from the drafted figures.
///
/// Run totals are the straight sums of the line figures; an empty draft
/// list still produces a run row (an empty month is a recorded fact, not
/// an error). Must run inside the caller's transaction: the UNIQUE
/// violation on the run insert is how a lost concurrent race surfaces.
pub(crate) async fn insert_run_with_lines(
    conn: &mut SqliteConnection,
    year: i32,
    month: u32,
    drafts: &[LineDraft],
) -> DbResult<PayrollRun> {
    let run = PayrollRun {
        id: Uuid::new_v4().to_string(),
        period_year: year,
        period_month: month,
        run_at: Utc::now(),
        total_gross_cents: drafts.iter().map(|d| d.gross.cents()).sum(),
        total_deductions_cents: drafts.iter().map(|d| d.deductions_applied.cents()).sum(),
        total_net_cents: drafts.iter().map(|d| d.net_pay.cents()).sum(),
    };

    sqlx::query(
        r#"
        INSERT INTO payroll_runs (
            id, period_year, period_month, run_at,
            total_gross_cents, total_deductions_cents, total_net_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&run.id)
    .bind(run.period_year)
    .bind(run.period_month)
    .bind(run.run_at)
    .bind(run.total_gross_cents)
    .bind(run.total_deductions_cents)
    .bind(run.total_net_cents)
    .execute(&mut *conn)
    .await?;

    for draft in drafts {
        sqlx::query(
            r#"
            INSERT INTO payroll_lines (
                id, payroll_run_id, employee_id, gross_cents,
                deductions_applied_cents, carry_forward_cents, net_pay_cents, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&run.id)
        .bind(&draft.employee_id)
        .bind(draft.gross.cents())
        .bind(draft.deductions_applied.cents())
        .bind(draft.carry_forward.cents())
        .bind(draft.net_pay.cents())
        .bind(Option::<String>::None)
        .execute(&mut *conn)
        .await?;
    }

    Ok(run)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use resto_core::Money;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn draft(employee_id: &str, gross: i64, ded: i64) -> LineDraft {
        LineDraft::net(
            employee_id.to_string(),
            Money::from_cents(gross),
            Money::from_cents(ded),
        )
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let run = insert_run_with_lines(
            &mut conn,
            2025,
            11,
            &[draft("e1", 50_000, 5_000), draft("e2", 20_000, 30_000)],
        )
        .await
        .unwrap();

        assert_eq!(run.total_gross_cents, 70_000);
        assert_eq!(run.total_deductions_cents, 35_000);
        // e1 nets 45_000, e2 nets 0 (carry-forward 10_000)
        assert_eq!(run.total_net_cents, 45_000);

        drop(conn);
        let loaded = db.payroll().get_by_period(2025, 11).await.unwrap().unwrap();
        assert_eq!(loaded.id, run.id);

        let lines = db.payroll().get_lines(&run.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].carry_forward_cents, 10_000);
        assert_eq!(lines[1].net_pay_cents, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let run = insert_run_with_lines(&mut conn, 2025, 10, &[draft("e1", 1_000, 0)])
            .await
            .unwrap();
        delete_run(&mut conn, &run.id).await.unwrap();

        assert!(find_by_period(&mut conn, 2025, 10).await.unwrap().is_none());
        assert!(fetch_lines(&mut conn, &run.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_run_is_valid() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let run = insert_run_with_lines(&mut conn, 2025, 9, &[]).await.unwrap();
        assert_eq!(run.total_net_cents, 0);

        assert!(fetch_lines(&mut conn, &run.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_period_unique_constraint() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        insert_run_with_lines(&mut conn, 2025, 8, &[]).await.unwrap();
        let err = insert_run_with_lines(&mut conn, 2025, 8, &[]).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
