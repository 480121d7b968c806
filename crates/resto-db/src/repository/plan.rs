//! # Commission Plan Repository
//!
//! Database operations for commission plans, including the atomic
//! set-default operation and the plan-book preload used by aggregation.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use resto_core::commission::PlanBook;
use resto_core::{CommissionPlan, Employee, Role};

/// Repository for commission plan operations.
#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    /// Creates a new PlanRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PlanRepository { pool }
    }

    /// Gets a plan by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CommissionPlan>> {
        let plan = sqlx::query_as::<_, CommissionPlan>(
            r#"
            SELECT id, name, role, is_default, brackets_json, created_at, updated_at
            FROM commission_plans
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    /// Gets the default plan for a role, if one is set.
    pub async fn get_default(&self, role: Role) -> DbResult<Option<CommissionPlan>> {
        let mut conn = self.pool.acquire().await?;
        fetch_default(&mut conn, role).await
    }

    /// Creates a new plan.
    ///
    /// The bracket JSON is stored as-is; it is parsed leniently at
    /// resolution time, so admin tooling with older field spellings keeps
    /// working.
    pub async fn create(
        &self,
        name: &str,
        role: Role,
        brackets_json: &str,
    ) -> DbResult<CommissionPlan> {
        let now = Utc::now();
        let plan = CommissionPlan {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
            is_default: false,
            brackets_json: brackets_json.to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %plan.id, ?role, "Creating commission plan");

        sqlx::query(
            r#"
            INSERT INTO commission_plans (
                id, name, role, is_default, brackets_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&plan.id)
        .bind(&plan.name)
        .bind(plan.role)
        .bind(plan.is_default)
        .bind(&plan.brackets_json)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(plan)
    }

    /// Makes a plan the default for its role.
    ///
    /// Clears the previous default and sets the new one inside a single
    /// transaction, so a concurrent reader never observes a role with two
    /// defaults or none. (A partial unique index on the table backs this up
    /// at the schema level.)
    pub async fn set_default(&self, plan_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let plan = sqlx::query_as::<_, CommissionPlan>(
            "SELECT id, name, role, is_default, brackets_json, created_at, updated_at \
             FROM commission_plans WHERE id = ?1",
        )
        .bind(plan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("CommissionPlan", plan_id))?;

        let now = Utc::now();

        sqlx::query(
            "UPDATE commission_plans SET is_default = 0, updated_at = ?2 \
             WHERE role = ?1 AND is_default = 1",
        )
        .bind(plan.role)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE commission_plans SET is_default = 1, updated_at = ?2 WHERE id = ?1")
            .bind(plan_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(id = %plan_id, role = ?plan.role, "Default plan switched");
        Ok(())
    }

    /// Preloads the plan book for a set of employees (pool-bound wrapper).
    pub async fn plan_book(&self, employees: &[Employee], role: Role) -> DbResult<PlanBook> {
        let mut conn = self.pool.acquire().await?;
        load_plan_book(&mut conn, employees, role).await
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Fetches the default plan for a role on an existing connection.
pub(crate) async fn fetch_default(
    conn: &mut SqliteConnection,
    role: Role,
) -> DbResult<Option<CommissionPlan>> {
    let plan = sqlx::query_as::<_, CommissionPlan>(
        "SELECT id, name, role, is_default, brackets_json, created_at, updated_at \
         FROM commission_plans WHERE role = ?1 AND is_default = 1",
    )
    .bind(role)
    .fetch_optional(conn)
    .await?;

    Ok(plan)
}

/// Loads a consistent plan snapshot for aggregation: each employee's
/// assigned plan plus the role default, on the caller's connection so the
/// whole run reads one snapshot.
pub(crate) async fn load_plan_book(
    conn: &mut SqliteConnection,
    employees: &[Employee],
    role: Role,
) -> DbResult<PlanBook> {
    let mut book = PlanBook::new();

    if let Some(default) = fetch_default(conn, role).await? {
        book.insert_default(default);
    }

    for employee in employees {
        let plan_id = match &employee.commission_plan_id {
            Some(id) => id,
            None => continue,
        };
        let plan = sqlx::query_as::<_, CommissionPlan>(
            "SELECT id, name, role, is_default, brackets_json, created_at, updated_at \
             FROM commission_plans WHERE id = ?1",
        )
        .bind(plan_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(plan) = plan {
            book.insert_assigned(employee.id.clone(), plan);
        }
        // A dangling plan id just falls through the resolver chain
    }

    Ok(book)
}

// =============================================================================
// Unit Tests
// =============================================================================
