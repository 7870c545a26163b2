use thiserror::Error;

/// Crate-wide error type.
///
/// Mutating data-access functions surface their user-facing failure
/// message through these variants: validation failures are rejected
/// before any write, constraint violations are translated into the
/// specific variants after a failed write, and anything else from the
/// storage layer lands in `Database`/`Rusqlite`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("A budget for this category already exists.")]
    DuplicateBudget,

    #[error("Category '{0}' does not exist.")]
    MissingCategory(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
