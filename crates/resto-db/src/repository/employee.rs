//! # Employee Repository
//!
//! Read-mostly access to the employee roster. The payout engine treats
//! employees as reference data; only the roster tooling writes here.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use resto_core::{Employee, EmployeeType};

/// Repository for employee operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Creates an employee.
    pub async fn create(
        &self,
        name: &str,
        employee_type: EmployeeType,
        commission_plan_id: Option<&str>,
    ) -> DbResult<Employee> {
        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            employee_type,
            commission_plan_id: commission_plan_id.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %employee.id, ?employee_type, "Creating employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, name, employee_type, commission_plan_id, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(employee.employee_type)
        .bind(&employee.commission_plan_id)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Gets an employee by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT id, name, employee_type, commission_plan_id, is_active, created_at, updated_at \
             FROM employees WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Assigns (or clears) an employee's commission plan.
    pub async fn assign_plan(&self, employee_id: &str, plan_id: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE employees SET commission_plan_id = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(employee_id)
        .bind(plan_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", employee_id));
        }
        Ok(())
    }

    /// Deactivates an employee (soft delete).
    pub async fn deactivate(&self, employee_id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE employees SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(employee_id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", employee_id));
        }
        Ok(())
    }

    /// Lists active employees of a given type.
    pub async fn list_by_type(&self, employee_type: EmployeeType) -> DbResult<Vec<Employee>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_type(&mut conn, employee_type).await
    }

    /// Lists all active employees.
    pub async fn list_active(&self) -> DbResult<Vec<Employee>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active(&mut conn).await
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Fetches active employees of a given type on an existing connection.
pub(crate) async fn fetch_by_type(
    conn: &mut SqliteConnection,
    employee_type: EmployeeType,
) -> DbResult<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT id, name, employee_type, commission_plan_id, is_active, created_at, updated_at \
         FROM employees WHERE employee_type = ?1 AND is_active = 1 ORDER BY name",
    )
    .bind(employee_type)
    .fetch_all(conn)
    .await?;

    Ok(employees)
}

/// Fetches all active employees on an existing connection.
pub(crate) async fn fetch_active(conn: &mut SqliteConnection) -> DbResult<Vec<Employee>> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT id, name, employee_type, commission_plan_id, is_active, created_at, updated_at \
         FROM employees WHERE is_active = 1 ORDER BY name",
    )
    .fetch_all(conn)
    .await?;

    Ok(employees)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let e = db.employees().create("Asif", EmployeeType::Field, None).await.unwrap();

        let loaded = db.employees().get_by_id(&e.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Asif");
        assert_eq!(loaded.employee_type, EmployeeType::Field);
        assert!(loaded.is_active);
        assert!(loaded.commission_plan_id.is_none());
    }

    #[tokio::test]
    async fn test_list_by_type_excludes_inactive() {
        let db = db().await;
        let repo = db.employees();
        let a = repo.create("A", EmployeeType::Field, None).await.unwrap();
        repo.create("B", EmployeeType::Field, None).await.unwrap();
        repo.create("C", EmployeeType::Kitchen, None).await.unwrap();

        repo.deactivate(&a.id).await.unwrap();

        let field = repo.list_by_type(EmployeeType::Field).await.unwrap();
        assert_eq!(field.len(), 1);
        assert_eq!(field[0].name, "B");
    }

    #[tokio::test]
    async fn test_assign_plan() {
        let db = db().await;
        let plan = db
            .plans()
            .create("P", resto_core::Role::Field, "[]")
            .await
            .unwrap();
        let e = db.employees().create("A", EmployeeType::Field, None).await.unwrap();

        db.employees().assign_plan(&e.id, Some(&plan.id)).await.unwrap();
        let loaded = db.employees().get_by_id(&e.id).await.unwrap().unwrap();
        assert_eq!(loaded.commission_plan_id.as_deref(), Some(plan.id.as_str()));

        db.employees().assign_plan(&e.id, None).await.unwrap();
        let loaded = db.employees().get_by_id(&e.id).await.unwrap().unwrap();
        assert!(loaded.commission_plan_id.is_none());
    }

    #[tokio::test]
    async fn test_assign_plan_missing_employee() {
        let db = db().await;
        let err = db.employees().assign_plan("ghost", None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
