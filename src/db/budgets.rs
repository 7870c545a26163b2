use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{Budget, BudgetPeriod};
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const JOINED_SELECT: &str = "SELECT b.id, b.category_id, b.limit_amount, b.period,
        c.name AS category_name, c.icon AS category_icon, c.color AS category_color
 FROM budgets b
 JOIN categories c ON b.category_id = c.id";

fn map_joined_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Budget> {
    let period_str: String = row.get(3)?;
    Ok(Budget {
        id: row.get(0)?,
        category_id: row.get(1)?,
        limit_amount: row.get(2)?,
        period: BudgetPeriod::from_db_value(&period_str),
        category_name: row.get(4)?,
        category_icon: row.get(5)?,
        category_color: row.get(6)?,
    })
}

fn validate_limit(limit_amount: f64) -> Result<()> {
    if !limit_amount.is_finite() || limit_amount <= 0.0 {
        return Err(Error::Validation(
            "Budget limit must be a positive number.".to_string(),
        ));
    }
    Ok(())
}

fn translate_constraint(err: rusqlite::Error, category_id: &str) -> Error {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed: budgets.category_id") {
        Error::DuplicateBudget
    } else if message.contains("FOREIGN KEY constraint failed") {
        Error::MissingCategory(category_id.to_string())
    } else {
        Error::Rusqlite(err)
    }
}

/// Lists all budgets joined with category display fields, ordered by
/// category name.
///
/// # Errors
///
/// Returns `Error::Database` if there's an issue acquiring the database
/// lock, preparing the SQL statement, or mapping query results.
#[instrument(skip(pool))]
pub async fn list_budgets(pool: &DbPool) -> Result<Vec<Budget>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for listing budgets".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!("{JOINED_SELECT} ORDER BY c.name ASC"))?;
    let budget_iter = stmt.query_map([], map_joined_row)?;

    let mut budgets = Vec::new();
    for budget_result in budget_iter {
        budgets.push(
            budget_result.map_err(|e| Error::Database(format!("Failed to map budget row: {}", e)))?,
        );
    }
    debug!("Fetched {} budgets.", budgets.len());
    Ok(budgets)
}

/// Fetches a single budget by identifier, with category display fields
/// joined in.
#[instrument(skip(pool))]
pub async fn get_budget_by_id(pool: &DbPool, id: &str) -> Result<Option<Budget>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!("{JOINED_SELECT} WHERE b.id = ?1"))?;
    let budget_result = stmt.query_row(params![id], map_joined_row).optional()?;
    Ok(budget_result)
}

/// Creates a budget for a category.
///
/// At most one budget may exist per category; the UNIQUE constraint on
/// `budgets.category_id` enforces this, and a violation is surfaced as
/// `Error::DuplicateBudget`. Retrying a successful create therefore
/// fails deterministically.
///
/// # Errors
///
/// Returns `Error::Validation` if `limit_amount` is not a finite
/// positive number, with no write attempted.
/// Returns `Error::DuplicateBudget` if the category already has a budget.
/// Returns `Error::MissingCategory` if `category_id` does not reference
/// an existing category.
#[instrument(skip(pool))]
pub async fn add_budget(
    pool: &DbPool,
    category_id: &str,
    limit_amount: f64,
    period: BudgetPeriod,
) -> Result<Budget> {
    validate_limit(limit_amount)?;
    let new_id = Uuid::new_v4().to_string();
    {
        let conn = pool.lock().map_err(|_| {
            Error::Database("Failed to acquire DB lock for adding budget".to_string())
        })?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO budgets (id, category_id, limit_amount, period) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![new_id, category_id, limit_amount, period.as_str()])
            .map_err(|e| translate_constraint(e, category_id))?;
    }
    info!(
        "Added budget {} for category {}: limit={}, period={}",
        new_id, category_id, limit_amount, period
    );
    get_budget_by_id(pool, &new_id)
        .await?
        .ok_or_else(|| Error::Database("Budget not found after insert".to_string()))
}

/// Updates a budget's limit and period.
///
/// The category of an existing budget cannot change - the UNIQUE
/// constraint makes re-pointing ambiguous; delete and re-create instead.
///
/// # Returns
///
/// Returns `Ok(Some(Budget))` with the updated joined record, or
/// `Ok(None)` if no budget with that identifier exists.
#[instrument(skip(pool))]
pub async fn update_budget(
    pool: &DbPool,
    id: &str,
    limit_amount: f64,
    period: BudgetPeriod,
) -> Result<Option<Budget>> {
    validate_limit(limit_amount)?;
    let rows_affected = {
        let conn = pool
            .lock()
            .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
        conn.execute(
            "UPDATE budgets SET limit_amount = ?1, period = ?2 WHERE id = ?3",
            params![limit_amount, period.as_str(), id],
        )?
    };
    if rows_affected == 0 {
        debug!("No budget with id {} to update.", id);
        return Ok(None);
    }
    info!("Updated budget {}: limit={}, period={}", id, limit_amount, period);
    get_budget_by_id(pool, id).await
}

/// Deletes a budget by identifier.
#[instrument(skip(pool))]
pub async fn delete_budget(pool: &DbPool, id: &str) -> Result<usize> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for delete".to_string()))?;
    let rows_affected = conn.execute("DELETE FROM budgets WHERE id = ?1", params![id])?;
    info!(
        "Attempted to delete budget '{}', rows affected: {}",
        id, rows_affected
    );
    Ok(rows_affected)
}

/// Fetches every budget for the bulk export path - raw rows, no
/// category join.
#[instrument(skip(pool))]
pub async fn get_all_budgets(pool: &DbPool) -> Result<Vec<Budget>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for export".to_string()))?;
    let mut stmt =
        conn.prepare_cached("SELECT id, category_id, limit_amount, period FROM budgets")?;
    let budget_iter = stmt.query_map([], |row| {
        let period_str: String = row.get(3)?;
        Ok(Budget {
            id: row.get(0)?,
            category_id: row.get(1)?,
            limit_amount: row.get(2)?,
            period: BudgetPeriod::from_db_value(&period_str),
            category_name: None,
            category_icon: None,
            category_color: None,
        })
    })?;

    let mut budgets = Vec::new();
    for budget_result in budget_iter {
        budgets.push(
            budget_result.map_err(|e| Error::Database(format!("Failed to map budget row: {}", e)))?,
        );
    }
    Ok(budgets)
}

/// Replaces the entire budgets table with the given records.
///
/// Records referencing a missing category or carrying a non-positive
/// limit are skipped with a warning; records without an identifier get
/// a generated one. Runs in one transaction.
///
/// # Returns
///
/// Returns `Ok(usize)` with the number of records actually inserted.
#[instrument(skip(pool, budgets))]
pub async fn import_budgets(pool: &DbPool, budgets: &[Budget]) -> Result<usize> {
    let mut conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for import".to_string()))?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::Database(format!("Failed to start transaction for import: {}", e)))?;

    tx.execute("DELETE FROM budgets", [])?;
    let mut imported_count = 0;
    {
        let mut check_stmt = tx.prepare_cached("SELECT 1 FROM categories WHERE id = ?1")?;
        let mut insert_stmt = tx.prepare_cached(
            "INSERT INTO budgets (id, category_id, limit_amount, period) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in budgets {
            let category_exists: Option<i64> = check_stmt
                .query_row(params![record.category_id], |row| row.get(0))
                .optional()?;
            if category_exists.is_none() {
                warn!(
                    "Skipping budget import due to missing category_id: {}",
                    record.category_id
                );
                continue;
            }
            if !record.limit_amount.is_finite() || record.limit_amount <= 0.0 {
                warn!(
                    "Skipping budget import for category_id {} due to invalid limit: {}",
                    record.category_id, record.limit_amount
                );
                continue;
            }
            let id = if record.id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                record.id.clone()
            };
            insert_stmt.execute(params![
                id,
                record.category_id,
                record.limit_amount,
                record.period.as_str(),
            ])?;
            imported_count += 1;
        }
    }
    tx.commit()
        .map_err(|e| Error::Database(format!("Failed to commit budget import: {}", e)))?;
    info!("Imported {} budgets (full replace).", imported_count);
    Ok(imported_count)
}
