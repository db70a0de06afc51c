//! Record store error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid record for {table}: {reason}")]
    InvalidRecord { table: &'static str, reason: String },

    #[error("Entity not found: {0}")]
    NotFound(String),
}
