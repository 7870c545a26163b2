use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::AppSetting;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument, warn};

/// Retrieves a value from the key-value `app_settings` table.
///
/// This table holds process-wide configuration such as the selected
/// display currency (stored as a JSON string literal) and the one-time
/// seed marker.
///
/// # Parameters
///
/// * `pool`: The database connection pool.
/// * `key`: The key whose value is to be retrieved.
///
/// # Returns
///
/// Returns `Ok(Some(String))` if the key exists and a value is found.
/// Returns `Ok(None)` if the key does not exist in the table.
///
/// # Errors
///
/// Returns `Error::Database` if there's an issue acquiring the database
/// lock, preparing the SQL statement, or mapping the query result.
#[instrument(skip(pool))]
pub async fn get_setting(pool: &DbPool, key: &str) -> Result<Option<String>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached("SELECT value FROM app_settings WHERE key = ?1")?;
    let value_result: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    debug!("Setting for key '{}': {:?}", key, value_result);
    Ok(value_result)
}

/// Sets or updates a value in the key-value `app_settings` table.
///
/// If the key already exists, its value is updated. If the key does not
/// exist, a new key-value pair is inserted (UPSERT behavior).
///
/// # Errors
///
/// Returns `Error::Database` if there's an issue acquiring the database
/// lock or executing the insert/update statement.
#[instrument(skip(pool, value))]
pub async fn set_setting(pool: &DbPool, key: &str, value: &str) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    conn.execute(
        "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    info!("Set setting: {} = {}", key, value);
    Ok(())
}

/// Fetches every setting row for the bulk export path.
#[instrument(skip(pool))]
pub async fn get_all_settings(pool: &DbPool) -> Result<Vec<AppSetting>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for export".to_string()))?;
    let mut stmt = conn.prepare_cached("SELECT key, value FROM app_settings")?;
    let setting_iter = stmt.query_map([], |row| {
        Ok(AppSetting {
            key: row.get(0)?,
            value: row.get(1)?,
        })
    })?;

    let mut settings = Vec::new();
    for setting_result in setting_iter {
        settings.push(
            setting_result
                .map_err(|e| Error::Database(format!("Failed to map setting row: {}", e)))?,
        );
    }
    Ok(settings)
}

/// Upserts the given settings. Unlike the other entity imports this is
/// not a full replace - keys absent from the import keep their current
/// values. Records with an empty key are skipped with a warning.
///
/// # Returns
///
/// Returns `Ok(usize)` with the number of records actually applied.
#[instrument(skip(pool, settings))]
pub async fn import_settings(pool: &DbPool, settings: &[AppSetting]) -> Result<usize> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for import".to_string()))?;
    let mut imported_count = 0;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )?;
    for setting in settings {
        if setting.key.is_empty() {
            warn!("Skipping setting import with empty key");
            continue;
        }
        stmt.execute(params![setting.key, setting.value])?;
        imported_count += 1;
    }
    info!("Imported {} settings (upsert).", imported_count);
    Ok(imported_count)
}
