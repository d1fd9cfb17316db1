//! Persistence of entities owned by a service
//!
//! Both stores use SQLite through [`sqlx`]. Timestamps are stored as RFC 3339 strings and
//! nested JSON as serialized text. The schema is created on startup if it does not exist.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;

mod orders;
mod users;

pub use orders::*;
pub use users::*;

/// SQLite extended result code of a violated `UNIQUE` constraint
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
/// SQLite extended result code of a violated `PRIMARY KEY` constraint
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";

/// Errors returned by stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity does not exist
    #[error("entity not found")]
    NotFound,
    /// The entity violates a uniqueness constraint
    #[error("entity conflicts with an existing one")]
    Conflict,
    /// A stored row could not be converted back into an entity
    #[error("stored entity is malformed: {0}")]
    Malformed(String),
    /// The database returned an unexpected error
    #[error("storage backend failed")]
    Backend(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref database_error) => {
                let code = database_error.code();
                let is_conflict = matches!(
                    code.as_deref(),
                    Some(SQLITE_CONSTRAINT_UNIQUE) | Some(SQLITE_CONSTRAINT_PRIMARYKEY)
                ) || database_error.message().contains("UNIQUE constraint failed");

                if is_conflict {
                    StoreError::Conflict
                } else {
                    StoreError::Backend(error)
                }
            }
            error => StoreError::Backend(error),
        }
    }
}

/// Opens a connection pool, creating the database file if it does not exist
pub async fn connect(url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    Ok(pool)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("invalid timestamp '{}': {}", value, e)))
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // A single connection keeps the in-memory database alive and shared
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}
