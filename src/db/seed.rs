use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::{Error, Result};
use rusqlite::{OptionalExtension, params};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Reserved settings key marking that one-time seeding has run.
pub const SEED_MARKER_KEY: &str = "db_initial_data_seeded_v1";
/// Settings key holding the selected display currency (JSON string).
pub const SELECTED_CURRENCY_KEY: &str = "selectedCurrency";

/// Seeds a fresh store from the config: categories, their optional
/// monthly budgets, and the default currency setting.
///
/// The whole routine is guarded by [`SEED_MARKER_KEY`] so it runs at
/// most once per store. Within a first run, categories that already
/// exist by name are left alone, so seeding a store that already holds
/// imported data never duplicates or overwrites.
///
/// # Errors
///
/// Returns `Error::Database` if the lock, the transaction, or any of
/// the statements fail; a failure before commit leaves the store
/// unseeded and unmarked.
#[instrument(skip(pool, config))]
pub async fn seed_initial_data(pool: &DbPool, config: &Arc<AppConfig>) -> Result<()> {
    let mut conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for seeding".to_string()))?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::Database(format!("Failed to start transaction for seeding: {}", e)))?;

    let marker: Option<String> = tx
        .prepare_cached("SELECT value FROM app_settings WHERE key = ?1")?
        .query_row(params![SEED_MARKER_KEY], |row| row.get(0))
        .optional()?;
    if marker.as_deref() == Some("true") {
        debug!("Seed marker found, skipping initial data seeding.");
        return Ok(());
    }

    info!(
        "Seed marker not found. Seeding {} category configurations.",
        config.categories.len()
    );
    for cfg_category in &config.categories {
        if cfg_category.name.trim().is_empty() {
            warn!("Skipping seed category with empty name.");
            continue;
        }

        // Only seed a category that does not already exist by name
        let existing_id: Option<String> = tx
            .prepare_cached("SELECT id FROM categories WHERE name = ?1")?
            .query_row(params![cfg_category.name], |row| row.get(0))
            .optional()?;
        let category_id = if let Some(id) = existing_id {
            debug!(
                "Category '{}' already exists, skipping insert.",
                cfg_category.name
            );
            id
        } else {
            let new_id = Uuid::new_v4().to_string();
            tx.prepare_cached(
                "INSERT INTO categories (id, name, icon, color) VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![
                new_id,
                cfg_category.name,
                cfg_category.icon,
                cfg_category.color,
            ])?;
            info!("Seeded category '{}' (ID: {})", cfg_category.name, new_id);
            new_id
        };

        if let Some(limit) = cfg_category.monthly_limit {
            if !limit.is_finite() || limit <= 0.0 {
                warn!(
                    "Skipping seed budget for '{}' due to invalid limit: {}",
                    cfg_category.name, limit
                );
                continue;
            }
            let budget_exists: Option<i64> = tx
                .prepare_cached("SELECT 1 FROM budgets WHERE category_id = ?1")?
                .query_row(params![category_id], |row| row.get(0))
                .optional()?;
            if budget_exists.is_none() {
                tx.prepare_cached(
                    "INSERT INTO budgets (id, category_id, limit_amount, period)
                     VALUES (?1, ?2, ?3, 'monthly')",
                )?
                .execute(params![Uuid::new_v4().to_string(), category_id, limit])?;
                info!(
                    "Seeded monthly budget of {} for category '{}'",
                    limit, cfg_category.name
                );
            }
        }
    }

    // Default currency, only when not already set
    let currency_set: Option<String> = tx
        .prepare_cached("SELECT value FROM app_settings WHERE key = ?1")?
        .query_row(params![SELECTED_CURRENCY_KEY], |row| row.get(0))
        .optional()?;
    if currency_set.is_none() {
        let encoded = serde_json::to_string(&config.default_currency)?;
        tx.prepare_cached("INSERT INTO app_settings (key, value) VALUES (?1, ?2)")?
            .execute(params![SELECTED_CURRENCY_KEY, encoded])?;
        info!("Seeded default currency setting: {}", config.default_currency);
    }

    tx.prepare_cached(
        "INSERT INTO app_settings (key, value) VALUES (?1, 'true')
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )?
    .execute(params![SEED_MARKER_KEY])?;

    tx.commit()
        .map_err(|e| Error::Database(format!("Failed to commit seeding: {}", e)))?;
    info!("Initial data seeding complete; marker set.");
    Ok(())
}
