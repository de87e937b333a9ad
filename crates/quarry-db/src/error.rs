//! Error types for quarry-db.

use miette::Diagnostic;
use thiserror::Error;

use crate::query::Operation;

/// Database error type for quarry-db operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("No table selected")]
    #[diagnostic(
        code(quarry_db::no_table),
        help("Seed the builder with from()/to() before building a statement")
    )]
    NoTableSelected,

    #[error("No fields provided for {0}")]
    #[diagnostic(
        code(quarry_db::empty_fields),
        help("Pass at least one column/value pair")
    )]
    EmptyFields(Operation),

    #[error("Statement is already {current}, cannot change it to {requested}")]
    #[diagnostic(
        code(quarry_db::operation_changed),
        help("A builder produces exactly one statement; seed a new one with from()/to()")
    )]
    OperationChanged {
        current: Operation,
        requested: Operation,
    },

    #[error("Empty value list for `{0} IN (...)`")]
    #[diagnostic(
        code(quarry_db::empty_value_list),
        help("An IN condition needs at least one value")
    )]
    EmptyValueList(String),

    #[error("Page number must be greater than zero")]
    #[diagnostic(code(quarry_db::invalid_page))]
    InvalidPage,

    #[error("Rows per page must be greater than zero")]
    #[diagnostic(code(quarry_db::invalid_rows_per_page))]
    InvalidRowsPerPage,

    #[error("Column {0} not found")]
    #[diagnostic(code(quarry_db::missing_column))]
    MissingColumn(String),

    #[error("Column {column} is not a {expected}")]
    #[diagnostic(code(quarry_db::type_mismatch))]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("Column {column} failed {check} validation")]
    #[diagnostic(code(quarry_db::failed_validation))]
    FailedValidation {
        column: String,
        check: &'static str,
    },

    #[error("Driver {0} cannot be opened by this executor, only sqlite")]
    #[diagnostic(
        code(quarry_db::unsupported_driver),
        help("Open the connection yourself and inject it with Database::new")
    )]
    UnsupportedDriver(String),

    #[error("JSON column error: {0}")]
    #[diagnostic(code(quarry_db::json))]
    JsonError(#[from] serde_json::Error),

    #[error("SQLite database error: {0}")]
    #[diagnostic(code(quarry_db::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("Thread lock poison error")]
    #[diagnostic(code(quarry_db::poisoned))]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Result type alias for quarry-db operations.
pub type Result<T> = std::result::Result<T, DbError>;
