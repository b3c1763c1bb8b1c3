//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not owned by caller: {0}")]
    Forbidden(String),

    #[error("Conflicting state: {0}")]
    Conflict(String),
}

impl DbError {
    /// Map an insert failure, turning unique-constraint violations into `Duplicate`
    pub(crate) fn on_insert(err: sqlx::Error, what: impl FnOnce() -> String) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Duplicate(what())
            }
            _ => DbError::Connection(err),
        }
    }
}
