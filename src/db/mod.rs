pub mod budgets;
pub mod categories;
pub mod connection;
pub(crate) mod schema;
pub mod seed;
pub mod settings;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod transactions;

pub use budgets::{
    add_budget, delete_budget, get_all_budgets, get_budget_by_id, import_budgets, list_budgets,
    update_budget,
};
pub use categories::{
    add_category, delete_category, get_category_by_id, import_categories, list_categories,
    update_category,
};
pub use connection::{DbPool, init_db};
pub use seed::{SEED_MARKER_KEY, SELECTED_CURRENCY_KEY, seed_initial_data};
pub use settings::{get_all_settings, get_setting, import_settings, set_setting};
pub use transactions::{
    SortDirection, SortKey, TransactionFilter, TransactionInput, add_transaction,
    delete_transaction, get_all_transactions, get_transaction_by_id, import_transactions,
    list_transactions, total_spent_for_category, update_transaction,
};
