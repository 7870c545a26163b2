use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{Transaction, TransactionType};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, ToSql, params, params_from_iter};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Columns a transaction listing may be sorted by. Anything else a
/// caller supplies falls back to `Date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Date,
    Description,
    Amount,
    Type,
}

impl SortKey {
    /// Parses a caller-supplied sort key, falling back to `Date` for
    /// unknown values. The column name is never interpolated from raw
    /// input.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "date" => Self::Date,
            "description" => Self::Description,
            "amount" => Self::Amount,
            "type" => Self::Type,
            other => {
                warn!("Unknown sort key '{}', falling back to date", other);
                Self::Date
            }
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Date => "t.date",
            Self::Description => "t.description",
            Self::Amount => "t.amount",
            Self::Type => "t.kind",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Filter for [`list_transactions`]. Every field is optional; an omitted
/// field imposes no constraint. Date bounds are inclusive and compared
/// on the calendar-day part of the stored timestamp.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub search_term: Option<String>,
    pub category_id: Option<String>,
    pub kind: Option<TransactionType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub limit: Option<u32>,
}

/// Field set for creating or updating a transaction.
#[derive(Debug)]
pub struct TransactionInput<'a> {
    pub date: DateTime<Utc>,
    pub description: &'a str,
    pub amount: f64,
    pub kind: TransactionType,
    pub category_id: &'a str,
}

const JOINED_SELECT: &str = "SELECT t.id, t.date, t.description, t.amount, t.kind, t.category_id,
        c.name AS category_name, c.icon AS category_icon, c.color AS category_color
 FROM transactions t
 JOIN categories c ON t.category_id = c.id";

fn map_joined_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(4)?;
    let kind = kind_str
        .parse::<TransactionType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        kind,
        category_id: row.get(5)?,
        category_name: row.get(6)?,
        category_icon: row.get(7)?,
        category_color: row.get(8)?,
    })
}

fn validate_input(input: &TransactionInput<'_>) -> Result<()> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(Error::Validation(
            "Transaction amount must be a positive number.".to_string(),
        ));
    }
    if input.description.trim().is_empty() {
        return Err(Error::Validation(
            "Transaction description must not be empty.".to_string(),
        ));
    }
    Ok(())
}

fn translate_constraint(err: rusqlite::Error, category_id: &str) -> Error {
    if err.to_string().contains("FOREIGN KEY constraint failed") {
        Error::MissingCategory(category_id.to_string())
    } else {
        Error::Rusqlite(err)
    }
}

/// Lists transactions matching the filter, joined with category display
/// fields, sorted and optionally limited.
///
/// # Parameters
///
/// * `pool`: The database connection pool.
/// * `filter`: Constraints, sort order, and limit; see
///   [`TransactionFilter`].
///
/// # Errors
///
/// Returns `Error::Database` if there's an issue acquiring the database
/// lock, preparing the SQL statement, or mapping query results.
#[instrument(skip(pool))]
pub async fn list_transactions(pool: &DbPool, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let conn = pool.lock().map_err(|_| {
        Error::Database("Failed to acquire DB lock for listing transactions".to_string())
    })?;

    let mut query = JOINED_SELECT.to_string();
    let mut conditions: Vec<&str> = Vec::new();
    let mut query_params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(term) = &filter.search_term {
        conditions.push("t.description LIKE ?");
        query_params.push(Box::new(format!("%{term}%")));
    }
    if let Some(category_id) = &filter.category_id {
        conditions.push("t.category_id = ?");
        query_params.push(Box::new(category_id.clone()));
    }
    if let Some(kind) = filter.kind {
        conditions.push("t.kind = ?");
        query_params.push(Box::new(kind.as_str()));
    }
    if let Some(start) = filter.start_date {
        conditions.push("strftime('%Y-%m-%d', t.date) >= ?");
        query_params.push(Box::new(start.format("%Y-%m-%d").to_string()));
    }
    if let Some(end) = filter.end_date {
        conditions.push("strftime('%Y-%m-%d', t.date) <= ?");
        query_params.push(Box::new(end.format("%Y-%m-%d").to_string()));
    }

    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    // Sort column comes from the SortKey whitelist, never from raw input
    query.push_str(&format!(
        " ORDER BY {} {}",
        filter.sort_key.column(),
        filter.sort_direction.keyword()
    ));
    if let Some(limit) = filter.limit {
        query.push_str(" LIMIT ?");
        query_params.push(Box::new(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&query)?;
    let transaction_iter = stmt.query_map(
        params_from_iter(query_params.iter().map(|p| p.as_ref())),
        map_joined_row,
    )?;

    let mut transactions = Vec::new();
    for transaction_result in transaction_iter {
        transactions.push(
            transaction_result
                .map_err(|e| Error::Database(format!("Failed to map transaction row: {}", e)))?,
        );
    }
    debug!("Fetched {} transactions.", transactions.len());
    Ok(transactions)
}

/// Fetches a single transaction by identifier, with category display
/// fields joined in.
#[instrument(skip(pool))]
pub async fn get_transaction_by_id(pool: &DbPool, id: &str) -> Result<Option<Transaction>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!("{JOINED_SELECT} WHERE t.id = ?1"))?;
    let transaction_result = stmt.query_row(params![id], map_joined_row).optional()?;
    Ok(transaction_result)
}

/// Creates a new transaction with a generated identifier and returns
/// the stored record including the denormalized category fields.
///
/// # Errors
///
/// Returns `Error::Validation` if the amount is not a finite positive
/// number or the description is empty, with no write attempted.
/// Returns `Error::MissingCategory` if `category_id` does not reference
/// an existing category.
/// Returns `Error::Database` for any other storage failure.
#[instrument(skip(pool, input))]
pub async fn add_transaction(pool: &DbPool, input: &TransactionInput<'_>) -> Result<Transaction> {
    validate_input(input)?;
    let new_id = Uuid::new_v4().to_string();
    {
        let conn = pool.lock().map_err(|_| {
            Error::Database("Failed to acquire DB lock for adding transaction".to_string())
        })?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO transactions (id, date, description, amount, kind, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        stmt.execute(params![
            new_id,
            input.date,
            input.description,
            input.amount,
            input.kind.as_str(),
            input.category_id,
        ])
        .map_err(|e| translate_constraint(e, input.category_id))?;
    }
    info!(
        "Created transaction {}: kind='{}', amount={}, category_id={}",
        new_id, input.kind, input.amount, input.category_id
    );
    get_transaction_by_id(pool, &new_id)
        .await?
        .ok_or_else(|| Error::Database("Transaction not found after insert".to_string()))
}

/// Updates an existing transaction in place.
///
/// # Returns
///
/// Returns `Ok(Some(Transaction))` with the updated joined record, or
/// `Ok(None)` if no transaction with that identifier exists.
#[instrument(skip(pool, input))]
pub async fn update_transaction(
    pool: &DbPool,
    id: &str,
    input: &TransactionInput<'_>,
) -> Result<Option<Transaction>> {
    validate_input(input)?;
    let rows_affected = {
        let conn = pool
            .lock()
            .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
        conn.execute(
            "UPDATE transactions SET date = ?1, description = ?2, amount = ?3, kind = ?4, category_id = ?5
             WHERE id = ?6",
            params![
                input.date,
                input.description,
                input.amount,
                input.kind.as_str(),
                input.category_id,
                id,
            ],
        )
        .map_err(|e| translate_constraint(e, input.category_id))?
    };
    if rows_affected == 0 {
        debug!("No transaction with id {} to update.", id);
        return Ok(None);
    }
    info!("Updated transaction {}", id);
    get_transaction_by_id(pool, id).await
}

/// Deletes a transaction by identifier.
#[instrument(skip(pool))]
pub async fn delete_transaction(pool: &DbPool, id: &str) -> Result<usize> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for delete".to_string()))?;
    let rows_affected = conn.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
    info!(
        "Attempted to delete transaction '{}', rows affected: {}",
        id, rows_affected
    );
    Ok(rows_affected)
}

/// Fetches every transaction for the bulk export path - raw rows, no
/// category join, newest first.
#[instrument(skip(pool))]
pub async fn get_all_transactions(pool: &DbPool) -> Result<Vec<Transaction>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for export".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, description, amount, kind, category_id
         FROM transactions ORDER BY date DESC",
    )?;
    let transaction_iter = stmt.query_map([], |row| {
        let kind_str: String = row.get(4)?;
        let kind = kind_str
            .parse::<TransactionType>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        Ok(Transaction {
            id: row.get(0)?,
            date: row.get(1)?,
            description: row.get(2)?,
            amount: row.get(3)?,
            kind,
            category_id: row.get(5)?,
            category_name: None,
            category_icon: None,
            category_color: None,
        })
    })?;

    let mut transactions = Vec::new();
    for transaction_result in transaction_iter {
        transactions.push(
            transaction_result
                .map_err(|e| Error::Database(format!("Failed to map transaction row: {}", e)))?,
        );
    }
    Ok(transactions)
}

/// Replaces the entire transactions table with the given records.
///
/// Records whose category reference does not resolve are skipped with a
/// warning; records without an identifier get a generated one. The
/// whole replacement runs in one transaction, so a storage failure
/// rolls back rather than leaving the table emptied.
///
/// # Returns
///
/// Returns `Ok(usize)` with the number of records actually inserted -
/// skipped records are excluded from the count.
#[instrument(skip(pool, transactions))]
pub async fn import_transactions(pool: &DbPool, transactions: &[Transaction]) -> Result<usize> {
    let mut conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for import".to_string()))?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::Database(format!("Failed to start transaction for import: {}", e)))?;

    tx.execute("DELETE FROM transactions", [])?;
    let mut imported_count = 0;
    {
        let mut check_stmt = tx.prepare_cached("SELECT 1 FROM categories WHERE id = ?1")?;
        let mut insert_stmt = tx.prepare_cached(
            "INSERT INTO transactions (id, date, description, amount, kind, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for record in transactions {
            let category_exists: Option<i64> = check_stmt
                .query_row(params![record.category_id], |row| row.get(0))
                .optional()?;
            if category_exists.is_none() {
                warn!(
                    "Skipping transaction import due to missing category_id: {}",
                    record.category_id
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
                record.date,
                record.description,
                record.amount,
                record.kind.as_str(),
                record.category_id,
            ])?;
            imported_count += 1;
        }
    }
    tx.commit()
        .map_err(|e| Error::Database(format!("Failed to commit transaction import: {}", e)))?;
    info!("Imported {} transactions (full replace).", imported_count);
    Ok(imported_count)
}

/// Calculates the total expense amount for a category within a closed
/// calendar-date window.
///
/// Only `expense` transactions count; the window boundaries are
/// inclusive and compared on the date part of the stored timestamp, so
/// a transaction at any time of day on a boundary date is included.
///
/// # Returns
///
/// Returns `Ok(f64)` with the sum, or 0.0 if no transactions match.
///
/// # Errors
///
/// Returns `Error::Database` if there's an issue acquiring the database
/// lock, preparing the SQL statement, or executing the query.
#[instrument(skip(pool))]
pub async fn total_spent_for_category(
    pool: &DbPool,
    category_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<f64> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let start_str = start.format("%Y-%m-%d").to_string();
    let end_str = end.format("%Y-%m-%d").to_string();

    let mut stmt = conn.prepare_cached(
        "SELECT COALESCE(SUM(amount), 0.0) FROM transactions
         WHERE category_id = ?1 AND kind = 'expense'
           AND strftime('%Y-%m-%d', date) BETWEEN ?2 AND ?3",
    )?;
    let total_spent: f64 = stmt.query_row(params![category_id, start_str, end_str], |row| row.get(0))?;

    debug!(
        "Total spent for category {} in [{}, {}]: {:.2}",
        category_id, start_str, end_str, total_spent
    );
    Ok(total_spent)
}
