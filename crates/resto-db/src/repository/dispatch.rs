//! # Dispatch & Return Repository
//!
//! Persistence for field dispatches and their settlement returns.
//!
//! A dispatch has exactly two states: pending (no return row) and settled
//! (one return row). The `field_returns.dispatch_id` UNIQUE constraint is
//! the last line of defense for the one-return rule; [`create_return`]
//! checks first and maps a lost race back to the same error.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use resto_core::validation::{validate_dispatch_qty, validate_price_cents};
use resto_core::{reconcile, FieldDispatch, FieldReturn, NewFieldReturn};

/// Repository for dispatch and return operations.
#[derive(Debug, Clone)]
pub struct DispatchRepository {
    pool: SqlitePool,
}

impl DispatchRepository {
    /// Creates a new DispatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DispatchRepository { pool }
    }

    /// Records stock handed to a field worker.
    pub async fn create_dispatch(
        &self,
        waiter_id: &str,
        item_id: &str,
        qty_dispatched: i64,
        price_each_cents: i64,
        date: NaiveDate,
    ) -> DbResult<FieldDispatch> {
        validate_dispatch_qty(qty_dispatched)?;
        validate_price_cents(price_each_cents)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM employees WHERE id = ?1")
            .bind(waiter_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Employee", waiter_id));
        }

        let dispatch = FieldDispatch {
            id: Uuid::new_v4().to_string(),
            waiter_id: waiter_id.to_string(),
            item_id: item_id.to_string(),
            qty_dispatched,
            price_each_cents,
            date,
            created_at: Utc::now(),
        };

        debug!(id = %dispatch.id, waiter = %waiter_id, qty = qty_dispatched, "Creating dispatch");

        sqlx::query(
            r#"
            INSERT INTO field_dispatches (
                id, waiter_id, item_id, qty_dispatched, price_each_cents, date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&dispatch.id)
        .bind(&dispatch.waiter_id)
        .bind(&dispatch.item_id)
        .bind(dispatch.qty_dispatched)
        .bind(dispatch.price_each_cents)
        .bind(dispatch.date)
        .bind(dispatch.created_at)
        .execute(&self.pool)
        .await?;

        Ok(dispatch)
    }

    /// Gets a dispatch by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<FieldDispatch>> {
        let dispatch = sqlx::query_as::<_, FieldDispatch>(
            "SELECT id, waiter_id, item_id, qty_dispatched, price_each_cents, date, created_at \
             FROM field_dispatches WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dispatch)
    }

    /// Gets the return paired with a dispatch, if the dispatch is settled.
    pub async fn get_return(&self, dispatch_id: &str) -> DbResult<Option<FieldReturn>> {
        let ret = sqlx::query_as::<_, FieldReturn>(
            "SELECT id, dispatch_id, qty_returned, loss_qty, cash_collected_cents, note, \
             created_at FROM field_returns WHERE dispatch_id = ?1",
        )
        .bind(dispatch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ret)
    }

    /// Settles a dispatch with its return.
    ///
    /// Validates the fields against the dispatch, rejects a second return,
    /// and writes the row. A concurrent settle that slips past the
    /// existence check is caught by the UNIQUE constraint and reported as
    /// the same `DuplicateReturn` error.
    pub async fn create_return(
        &self,
        dispatch_id: &str,
        fields: NewFieldReturn,
    ) -> DbResult<FieldReturn> {
        let dispatch = self
            .get_by_id(dispatch_id)
            .await?
            .ok_or_else(|| DbError::not_found("Dispatch", dispatch_id))?;

        reconcile::validate_return(&dispatch, &fields)?;

        if self.get_return(dispatch_id).await?.is_some() {
            return Err(DbError::DuplicateReturn { dispatch_id: dispatch_id.to_string() });
        }

        let ret = FieldReturn {
            id: Uuid::new_v4().to_string(),
            dispatch_id: dispatch_id.to_string(),
            qty_returned: fields.qty_returned,
            loss_qty: fields.loss_qty,
            cash_collected_cents: fields.cash_collected_cents,
            note: fields.note,
            created_at: Utc::now(),
        };

        debug!(
            dispatch = %dispatch_id,
            returned = ret.qty_returned,
            lost = ret.loss_qty,
            "Settling dispatch"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO field_returns (
                id, dispatch_id, qty_returned, loss_qty, cash_collected_cents, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&ret.id)
        .bind(&ret.dispatch_id)
        .bind(ret.qty_returned)
        .bind(ret.loss_qty)
        .bind(ret.cash_collected_cents)
        .bind(&ret.note)
        .bind(ret.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(ret),
            Err(e) => {
                let err = DbError::from(e);
                if matches!(&err, DbError::UniqueViolation { field } if field.contains("dispatch_id"))
                {
                    Err(DbError::DuplicateReturn { dispatch_id: dispatch_id.to_string() })
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Lists dispatches in a date range with their returns (pending ones
    /// come back with `None`).
    pub async fn list_with_returns(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        waiter_id: Option<&str>,
    ) -> DbResult<Vec<(FieldDispatch, Option<FieldReturn>)>> {
        let mut conn = self.pool.acquire().await?;
        fetch_with_returns(&mut conn, from, to, waiter_id).await
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Fetches dispatches in `[from, to]` joined with their returns, on an
/// existing connection.
///
/// Two queries joined in memory keeps both row mappings on the plain
/// `FromRow` derives instead of a hand-built combined row type.
pub(crate) async fn fetch_with_returns(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
    waiter_id: Option<&str>,
) -> DbResult<Vec<(FieldDispatch, Option<FieldReturn>)>> {
    let dispatches = match waiter_id {
        Some(waiter) => {
            sqlx::query_as::<_, FieldDispatch>(
                "SELECT id, waiter_id, item_id, qty_dispatched, price_each_cents, date, \
                 created_at FROM field_dispatches \
                 WHERE date >= ?1 AND date <= ?2 AND waiter_id = ?3 ORDER BY date, id",
            )
            .bind(from)
            .bind(to)
            .bind(waiter)
            .fetch_all(&mut *conn)
            .await?
        }
        None => {
            sqlx::query_as::<_, FieldDispatch>(
                "SELECT id, waiter_id, item_id, qty_dispatched, price_each_cents, date, \
                 created_at FROM field_dispatches \
                 WHERE date >= ?1 AND date <= ?2 ORDER BY date, id",
            )
            .bind(from)
            .bind(to)
            .fetch_all(&mut *conn)
            .await?
        }
    };

    let returns = sqlx::query_as::<_, FieldReturn>(
        "SELECT r.id, r.dispatch_id, r.qty_returned, r.loss_qty, r.cash_collected_cents, \
         r.note, r.created_at \
         FROM field_returns r \
         JOIN field_dispatches d ON d.id = r.dispatch_id \
         WHERE d.date >= ?1 AND d.date <= ?2",
    )
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_dispatch: std::collections::HashMap<String, FieldReturn> =
        returns.into_iter().map(|r| (r.dispatch_id.clone(), r)).collect();

    Ok(dispatches
        .into_iter()
        .map(|d| {
            let ret = by_dispatch.remove(&d.id);
            (d, ret)
        })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
