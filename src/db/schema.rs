use crate::errors::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

#[instrument(skip(conn))]
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    conn.execute_batch(
        "BEGIN;

        -- Key-value store; must exist first for the seed marker
        CREATE TABLE IF NOT EXISTS app_settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            icon TEXT,
            color TEXT
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('income', 'expense')),
            category_id TEXT NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
        CREATE INDEX IF NOT EXISTS idx_transactions_category_id ON transactions(category_id);

        -- category_id UNIQUE enforces at most one budget per category
        CREATE TABLE IF NOT EXISTS budgets (
            id TEXT PRIMARY KEY,
            category_id TEXT NOT NULL UNIQUE,
            limit_amount REAL NOT NULL,
            period TEXT NOT NULL CHECK(period IN ('weekly', 'monthly', 'yearly')),
            FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_budgets_category_id ON budgets(category_id);
        COMMIT;",
    )
    .map_err(|e| Error::Database(format!("Failed to create tables: {}", e)))?;
    info!("Database tables ensured.");
    Ok(())
}
