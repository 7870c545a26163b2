use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a transaction, stored as `"income"` / `"expense"` TEXT.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// The TEXT value stored in the `transactions.kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(crate::errors::Error::Database(format!(
                "Unknown transaction type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence granularity of a budget, stored as TEXT.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    /// The TEXT value stored in the `budgets.period` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parses a stored period value, falling back to `Monthly` for
    /// anything unrecognized. The period column carries a CHECK
    /// constraint, so the fallback only fires on data written outside
    /// this crate.
    #[must_use]
    pub fn from_db_value(value: &str) -> Self {
        match value {
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "yearly" => Self::Yearly,
            other => {
                tracing::warn!(
                    "Unrecognized budget period '{}', falling back to monthly",
                    other
                );
                Self::Monthly
            }
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Field names follow the interchange document (camelCase), so an export
// round-trips through serde without aliasing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String, // UUID v4, TEXT primary key
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>, // symbolic icon name, e.g. "Utensils"
    #[serde(default)]
    pub color: Option<String>, // CSS color spec
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>, // stored as ISO-8601 TEXT
    pub description: String,
    pub amount: f64, // always positive; `kind` carries the direction
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category_id: String,
    // Not stored on the row; populated by JOINs for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category_id: String, // UNIQUE - at most one budget per category
    pub limit_amount: f64,
    pub period: BudgetPeriod,
    // Denormalized display fields, populated by JOINs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_color: Option<String>,
}

/// One row of the `app_settings` key-value table. Values are free-form
/// strings, conventionally JSON-encoded (e.g. the selected currency code
/// is stored as a JSON string literal).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppSetting {
    pub key: String,
    pub value: String,
}
