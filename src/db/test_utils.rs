#![allow(dead_code)]
use crate::db::{DbPool, schema};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")), // Default to TRACE for tests if RUST_LOG is not set
        )
        .with_test_writer() // Crucial for `cargo test` output
        .try_init(); // Use try_init to avoid panic if already initialized
}

// Helper to create an in-memory DbPool for testing.
// Schema setup matches init_db, minus the file-backed connection.
pub(crate) async fn setup_test_db() -> Result<DbPool> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::Database(format!("Test DB: Failed to open in-memory: {}", e)))?;
    conn.execute("PRAGMA foreign_keys = ON;", [])
        .map_err(|e| Error::Database(format!("Test DB: Failed to enable foreign keys: {}", e)))?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

// Helper to quickly insert a test category with a fixed id for setup
// (not going through add_category, for focused tests)
pub(crate) fn direct_insert_category(
    conn: &Connection,
    id: &str,
    name: &str,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<()> {
    let mut stmt = conn
        .prepare_cached("INSERT INTO categories (id, name, icon, color) VALUES (?1, ?2, ?3, ?4)")?;
    stmt.execute(params![id, name, icon, color])?;
    Ok(())
}

pub(crate) fn direct_insert_transaction(
    conn: &Connection,
    id: &str,
    date: DateTime<Utc>,
    description: &str,
    amount: f64,
    kind: &str,
    category_id: &str,
) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions (id, date, description, amount, kind, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![id, date, description, amount, kind, category_id])?;
    Ok(())
}

pub(crate) fn direct_insert_budget(
    conn: &Connection,
    id: &str,
    category_id: &str,
    limit_amount: f64,
    period: &str,
) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO budgets (id, category_id, limit_amount, period) VALUES (?1, ?2, ?3, ?4)",
    )?;
    stmt.execute(params![id, category_id, limit_amount, period])?;
    Ok(())
}

// Row count for verifying cascades and full-replace imports
pub(crate) fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    // Table name comes from the test itself, never from input
    let mut stmt = conn.prepare(&format!("SELECT COUNT(*) FROM {table}"))?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(count)
}
