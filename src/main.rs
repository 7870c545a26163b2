use budget_buddy::config;
use budget_buddy::core::progress;
use budget_buddy::db;
use budget_buddy::errors::Result;
use chrono::Utc;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;
    info!("Successfully processed application configuration.");

    // 4. Initialize database (path comes from the config)
    let db_pool = db::init_db(&app_config.database_path)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. One-time seeding of categories, budgets, and default settings
    let arc_app_config = Arc::new(app_config);
    db::seed_initial_data(&db_pool, &arc_app_config)
        .await
        .inspect_err(|e| error!("Failed to seed initial data: {}", e))?;

    // 6. Print the budget progress report for today
    let today = Utc::now().date_naive();
    let overview = progress::budget_overview(&db_pool, today)
        .await
        .inspect_err(|e| error!("Failed to compute budget overview: {}", e))?;
    print!("{}", progress::format_budget_report(&overview, today));

    Ok(())
}
