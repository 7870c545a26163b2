use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};

/// Environment variable naming the config file; falls back to
/// `config.toml` in the working directory.
pub const CONFIG_PATH_ENV: &str = "BUDGET_BUDDY_CONFIG";

const DEFAULT_DATABASE_PATH: &str = "budget_buddy.sqlite";
const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct AppConfig {
    /// Path of the single-file SQLite store.
    pub database_path: String,
    /// ISO 4217 code seeded into the `selectedCurrency` setting.
    pub default_currency: String,
    /// Categories (and optional monthly budgets) seeded into a fresh store.
    pub categories: Vec<CategoryConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            categories: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>, // symbolic icon name for the UI layer
    #[serde(default)]
    pub color: Option<String>, // CSS color spec
    /// When set, seeding also creates a monthly budget with this limit.
    #[serde(default)]
    pub monthly_limit: Option<f64>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = fs::read_to_string(path_ref)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path_ref, e)))?;
    let app_config: AppConfig = toml::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "Failed to parse TOML from config file {:?}: {}",
            path_ref, e
        ))
    })?;
    Ok(app_config)
}

/// Resolves the config path from the environment and loads it.
///
/// A missing config file is not an error - the defaults (local database
/// file, EUR, no seed categories) apply. A present-but-invalid file is.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        tracing::info!(
            "Config file '{}' not found, using default configuration.",
            path
        );
        Ok(AppConfig::default())
    }
}
