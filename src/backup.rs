//! Full-store export and import.
//!
//! The interchange format is a single JSON document with top-level
//! arrays `settings`, `categories`, `transactions`, `budgets` and an
//! `exportedAt` timestamp. Missing top-level keys are tolerated on
//! import - that entity is simply skipped.

use crate::db::{DbPool, budgets, categories, settings, transactions};
use crate::errors::Result;
use crate::models::{AppSetting, Budget, Category, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// The interchange document. Every array defaults to empty so a
/// document missing a top-level key still deserializes.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: Vec<AppSetting>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
}

/// Per-entity counts of records actually applied by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub settings: usize,
    pub categories: usize,
    pub transactions: usize,
    pub budgets: usize,
}

impl ImportSummary {
    /// Total number of records applied across all entities.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.settings + self.categories + self.transactions + self.budgets
    }
}

/// Gathers every entity into an [`ExportFile`] stamped with the current
/// time. Transactions and budgets are exported raw (no category join).
#[instrument(skip(pool))]
pub async fn export_all(pool: &DbPool) -> Result<ExportFile> {
    let file = ExportFile {
        exported_at: Some(Utc::now()),
        settings: settings::get_all_settings(pool).await?,
        categories: categories::list_categories(pool).await?,
        transactions: transactions::get_all_transactions(pool).await?,
        budgets: budgets::get_all_budgets(pool).await?,
    };
    info!(
        "Exported {} settings, {} categories, {} transactions, {} budgets",
        file.settings.len(),
        file.categories.len(),
        file.transactions.len(),
        file.budgets.len()
    );
    Ok(file)
}

/// Applies an interchange document to the store.
///
/// Settings are upserted; categories, transactions, and budgets are
/// full-replace imports. Categories go in before transactions and
/// budgets: clearing the categories table cascades, and the referencing
/// entities are then rebuilt against the imported category set. Records
/// with unresolved category references are skipped and excluded from
/// the reported counts.
#[instrument(skip(pool, file))]
pub async fn import_all(pool: &DbPool, file: &ExportFile) -> Result<ImportSummary> {
    let summary = ImportSummary {
        settings: settings::import_settings(pool, &file.settings).await?,
        categories: categories::import_categories(pool, &file.categories).await?,
        transactions: transactions::import_transactions(pool, &file.transactions).await?,
        budgets: budgets::import_budgets(pool, &file.budgets).await?,
    };
    info!("Import applied {} records total", summary.total());
    Ok(summary)
}

/// Serializes the full store to pretty-printed JSON at `path`.
#[instrument(skip(pool))]
pub async fn export_to_file(pool: &DbPool, path: &Path) -> Result<ExportFile> {
    let file = export_all(pool).await?;
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json)?;
    info!("Wrote export to {:?}", path);
    Ok(file)
}

/// Reads an interchange document from `path` and applies it.
#[instrument(skip(pool))]
pub async fn import_from_file(pool: &DbPool, path: &Path) -> Result<ImportSummary> {
    let contents = fs::read_to_string(path)?;
    let file: ExportFile = serde_json::from_str(&contents)?;
    import_all(pool, &file).await
}
