//! # Salary Deduction Repository
//!
//! Append-only ledger of amounts owed by employees (advances, breakage,
//! stock loss). Payroll pulls a per-employee sum over the period's date
//! range; nothing here is ever updated or deleted.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use resto_core::{DeductionReason, Money, SalaryDeduction};

/// Repository for salary deduction operations.
#[derive(Debug, Clone)]
pub struct DeductionRepository {
    pool: SqlitePool,
}

impl DeductionRepository {
    /// Creates a new DeductionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeductionRepository { pool }
    }

    /// Records a deduction against an employee.
    pub async fn record(
        &self,
        employee_id: &str,
        amount_cents: i64,
        reason: DeductionReason,
        date: NaiveDate,
        note: Option<&str>,
    ) -> DbResult<SalaryDeduction> {
        if amount_cents < 0 {
            return Err(DbError::Validation(
                resto_core::ValidationError::InvalidQuantity {
                    field: "amount",
                    value: amount_cents,
                },
            ));
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM employees WHERE id = ?1")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Employee", employee_id));
        }

        let deduction = SalaryDeduction {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            amount_cents,
            reason,
            date,
            note: note.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(
            employee = %employee_id,
            amount_cents,
            ?reason,
            "Recording salary deduction"
        );

        sqlx::query(
            r#"
            INSERT INTO salary_deductions (
                id, employee_id, amount_cents, reason, date, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&deduction.id)
        .bind(&deduction.employee_id)
        .bind(deduction.amount_cents)
        .bind(deduction.reason)
        .bind(deduction.date)
        .bind(&deduction.note)
        .bind(deduction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(deduction)
    }

    /// Lists deductions for an employee in a date range.
    pub async fn list_for_employee(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<SalaryDeduction>> {
        let deductions = sqlx::query_as::<_, SalaryDeduction>(
            "SELECT id, employee_id, amount_cents, reason, date, note, created_at \
             FROM salary_deductions \
             WHERE employee_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date, created_at",
        )
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(deductions)
    }

    /// Sums deductions per employee over a date range.
    pub async fn totals_by_employee(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<BTreeMap<String, Money>> {
        let mut conn = self.pool.acquire().await?;
        sum_by_employee(&mut conn, from, to).await
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Sums deductions per employee in `[from, to]` on an existing connection.
pub(crate) async fn sum_by_employee(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> DbResult<BTreeMap<String, Money>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT employee_id, SUM(amount_cents) \
         FROM salary_deductions \
         WHERE date >= ?1 AND date <= ?2 \
         GROUP BY employee_id",
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|(id, cents)| (id, Money::from_cents(cents))).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
