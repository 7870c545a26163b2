//! Budget progress reporting.
//!
//! Combines the budget list, the spend-window resolver, and the expense
//! aggregate into per-budget and overall "spent / limit" figures.
//! Nothing is cached: every report recomputes the aggregates from
//! scratch, which keeps the numbers consistent with the store at the
//! cost of one aggregate scan per budget per report.

use crate::core::window::{SpendWindow, resolve_window};
use crate::db::{DbPool, budgets, transactions};
use crate::errors::Result;
use crate::models::Budget;
use chrono::NaiveDate;
use tracing::{debug, instrument};

/// Spend-versus-limit figures for one budget.
#[derive(Debug, Clone)]
pub struct BudgetProgress {
    /// The budget being reported on, with category display fields
    pub budget: Budget,
    /// The window the spending was aggregated over
    pub window: SpendWindow,
    /// Total expense amount within the window
    pub spent_amount: f64,
    /// Limit minus spent; negative when over budget
    pub remaining_amount: f64,
    /// Spent as a percentage of the limit (can exceed 100)
    pub progress_percent: f64,
}

/// Progress for every budget plus the overall roll-up.
#[derive(Debug, Clone)]
pub struct BudgetOverview {
    /// Per-budget figures, in category-name order
    pub budgets: Vec<BudgetProgress>,
    /// Sum of all limits
    pub total_limit: f64,
    /// Sum of all spent amounts
    pub total_spent: f64,
    /// Total spent as a percentage of the total limit
    pub overall_percent: f64,
}

/// Computes spend-versus-limit progress for a single budget.
///
/// Resolves the budget's period to the window containing `today`, then
/// aggregates expense transactions of the budget's category within it.
///
/// # Errors
///
/// Returns `Error::Database` if the aggregate query fails.
#[instrument(skip(pool, budget), fields(budget_id = %budget.id))]
pub async fn budget_progress(
    pool: &DbPool,
    budget: Budget,
    today: NaiveDate,
) -> Result<BudgetProgress> {
    let window = resolve_window(budget.period, today);
    let spent_amount =
        transactions::total_spent_for_category(pool, &budget.category_id, window.start, window.end)
            .await?;
    let progress_percent = calculate_progress(spent_amount, budget.limit_amount);
    let remaining_amount = budget.limit_amount - spent_amount;
    debug!(
        "Budget {} spent {:.2} of {:.2} ({:.1}%)",
        budget.id, spent_amount, budget.limit_amount, progress_percent
    );
    Ok(BudgetProgress {
        budget,
        window,
        spent_amount,
        remaining_amount,
        progress_percent,
    })
}

/// Computes progress for every budget and the overall roll-up.
#[instrument(skip(pool))]
pub async fn budget_overview(pool: &DbPool, today: NaiveDate) -> Result<BudgetOverview> {
    let all_budgets = budgets::list_budgets(pool).await?;
    let mut progresses = Vec::with_capacity(all_budgets.len());
    for budget in all_budgets {
        progresses.push(budget_progress(pool, budget, today).await?);
    }
    let total_limit: f64 = progresses.iter().map(|p| p.budget.limit_amount).sum();
    let total_spent: f64 = progresses.iter().map(|p| p.spent_amount).sum();
    Ok(BudgetOverview {
        budgets: progresses,
        total_limit,
        total_spent,
        overall_percent: calculate_progress(total_spent, total_limit),
    })
}

/// Calculates spending progress as a percentage of the limit.
///
/// - 0% = nothing spent
/// - 100% = limit exactly reached
/// - above 100% = over budget
///
/// A non-positive limit yields 0 rather than a division artifact.
#[must_use]
pub fn calculate_progress(spent: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return 0.0;
    }
    (spent / limit) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[███░░░░░░░] 30.1%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    // Result is mathematically in [0, length], truncation/sign loss intentional for display.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// Formats an overview into a human-readable multi-line report.
#[must_use]
pub fn format_budget_report(overview: &BudgetOverview, today: NaiveDate) -> String {
    use std::fmt::Write;

    if overview.budgets.is_empty() {
        return format!("Budget Progress - {today}\n  No budgets set yet.\n");
    }

    let mut report = format!("Budget Progress - {today}\n");
    for progress in &overview.budgets {
        let name = progress
            .budget
            .category_name
            .as_deref()
            .unwrap_or("Unknown Category");
        let over_or_left = if progress.remaining_amount < 0.0 {
            format!("{:.2} over", -progress.remaining_amount)
        } else {
            format!("{:.2} left", progress.remaining_amount)
        };
        // write! to a String is infallible
        let _ = writeln!(
            report,
            "  {} {} spent {:.2} of {:.2} ({}, {})",
            name,
            format_progress_bar(progress.progress_percent, None),
            progress.spent_amount,
            progress.budget.limit_amount,
            progress.budget.period,
            over_or_left,
        );
    }
    let _ = writeln!(
        report,
        "Overall: spent {:.2} of {:.2} ({:.1}%)",
        overview.total_spent, overview.total_limit, overview.overall_percent
    );
    report
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::db::test_utils::{
        direct_insert_budget, direct_insert_category, direct_insert_transaction,
        init_test_tracing, setup_test_db,
    };
    use crate::models::BudgetPeriod;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_calculate_progress_nothing_spent() {
        assert_eq!(calculate_progress(0.0, 400.0), 0.0);
    }

    #[test]
    fn test_calculate_progress_partial() {
        assert_eq!(calculate_progress(120.50, 400.0), 30.125);
    }

    #[test]
    fn test_calculate_progress_over_budget() {
        assert_eq!(calculate_progress(500.0, 400.0), 125.0);
    }

    #[test]
    fn test_calculate_progress_zero_limit() {
        // Zero limit edge case
        assert_eq!(calculate_progress(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_format_progress_bar_full() {
        let bar = format_progress_bar(100.0, Some(10));
        assert_eq!(bar, "[██████████] 100.0%");
    }

    #[test]
    fn test_format_progress_bar_half() {
        let bar = format_progress_bar(50.0, Some(10));
        assert_eq!(bar, "[█████░░░░░] 50.0%");
    }

    #[test]
    fn test_format_progress_bar_overspent_clamps_fill() {
        // The fill is clamped but the number still tells the truth
        let bar = format_progress_bar(125.0, Some(10));
        assert_eq!(bar, "[██████████] 125.0%");
    }

    #[tokio::test]
    async fn test_budget_progress_monthly_scenario() -> crate::errors::Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        {
            let conn = db_pool.lock().unwrap();
            direct_insert_category(&conn, "cat-2", "Food", None, None)?;
            direct_insert_budget(&conn, "bud-2", "cat-2", 400.0, "monthly")?;
            // Two expenses inside the current month totalling 120.50
            direct_insert_transaction(
                &conn,
                "t1",
                Utc.with_ymd_and_hms(2026, 8, 2, 10, 0, 0).unwrap(),
                "Groceries",
                75.50,
                "expense",
                "cat-2",
            )?;
            direct_insert_transaction(
                &conn,
                "t2",
                Utc.with_ymd_and_hms(2026, 8, 5, 19, 0, 0).unwrap(),
                "Dinner out",
                45.0,
                "expense",
                "cat-2",
            )?;
            // Outside the month: must not count
            direct_insert_transaction(
                &conn,
                "t3",
                Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap(),
                "July groceries",
                60.0,
                "expense",
                "cat-2",
            )?;
        }

        let budget = crate::db::budgets::get_budget_by_id(&db_pool, "bud-2")
            .await?
            .expect("Budget exists");
        let progress = budget_progress(&db_pool, budget, today).await?;

        assert_eq!(progress.window.start, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(progress.window.end, NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
        assert_eq!(progress.spent_amount, 120.50);
        assert_eq!(progress.remaining_amount, 279.50);
        assert_eq!(progress.progress_percent, 30.125);
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_overview_rolls_up() -> crate::errors::Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        {
            let conn = db_pool.lock().unwrap();
            direct_insert_category(&conn, "cat-1", "Housing", None, None)?;
            direct_insert_category(&conn, "cat-2", "Food", None, None)?;
            direct_insert_budget(&conn, "b1", "cat-1", 1500.0, "monthly")?;
            direct_insert_budget(&conn, "b2", "cat-2", 400.0, "monthly")?;
            direct_insert_transaction(
                &conn,
                "t1",
                Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
                "Rent",
                1500.0,
                "expense",
                "cat-1",
            )?;
            direct_insert_transaction(
                &conn,
                "t2",
                Utc.with_ymd_and_hms(2026, 8, 3, 12, 0, 0).unwrap(),
                "Groceries",
                100.0,
                "expense",
                "cat-2",
            )?;
        }

        let overview = budget_overview(&db_pool, today).await?;
        assert_eq!(overview.budgets.len(), 2);
        // Category-name order: Food before Housing
        assert_eq!(
            overview.budgets[0].budget.category_name.as_deref(),
            Some("Food")
        );
        assert_eq!(overview.total_limit, 1900.0);
        assert_eq!(overview.total_spent, 1600.0);
        assert!((overview.overall_percent - 84.2105).abs() < 0.001);

        let report = format_budget_report(&overview, today);
        assert!(report.contains("Food"));
        assert!(report.contains("Overall: spent 1600.00 of 1900.00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_overview_empty() -> crate::errors::Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        let overview = budget_overview(&db_pool, today).await?;
        assert!(overview.budgets.is_empty());
        assert_eq!(overview.overall_percent, 0.0);

        let report = format_budget_report(&overview, today);
        assert!(report.contains("No budgets set yet."));
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_progress_weekly_window() -> crate::errors::Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        // Friday 2026-08-07; the week is Aug 3 - Aug 9
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        {
            let conn = db_pool.lock().unwrap();
            direct_insert_category(&conn, "cat-2", "Food", None, None)?;
            direct_insert_budget(&conn, "b1", "cat-2", 100.0, "weekly")?;
            direct_insert_transaction(
                &conn,
                "t1",
                Utc.with_ymd_and_hms(2026, 8, 3, 8, 0, 0).unwrap(), // Monday, in
                "In-week",
                30.0,
                "expense",
                "cat-2",
            )?;
            direct_insert_transaction(
                &conn,
                "t2",
                Utc.with_ymd_and_hms(2026, 8, 2, 8, 0, 0).unwrap(), // Sunday before, out
                "Last week",
                50.0,
                "expense",
                "cat-2",
            )?;
        }
        let budget = crate::db::budgets::get_budget_by_id(&db_pool, "b1")
            .await?
            .expect("Budget exists");
        let progress = budget_progress(&db_pool, budget, today).await?;
        assert_eq!(progress.spent_amount, 30.0);
        assert_eq!(progress.progress_percent, 30.0);
        Ok(())
    }
}
