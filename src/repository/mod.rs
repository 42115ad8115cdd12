//! Table-level operations over a borrowed connection.
//!
//! Commands lock the shared connection and delegate here, which keeps the
//! logic testable against an in-memory database.

pub mod board;
pub mod categories;
pub mod company;
pub mod conversations;
pub mod customers;
pub mod dashboard;
pub mod offers;
pub mod orders;
pub mod products;
pub mod reports;
pub mod staff;
pub mod subscriptions;

use rusqlite::Connection;

use crate::error::{AppError, AppResult};

/// Fails with `NotFound` unless `table` has a row with this id.
pub(crate) fn ensure_exists(conn: &Connection, table: &str, id: i64, what: &str) -> AppResult<()> {
    let found: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
        [id],
        |row| row.get(0),
    )?;

    if found {
        Ok(())
    } else {
        Err(AppError::not_found(format!("{} {}", what, id)))
    }
}

pub(crate) fn require_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims optional text, mapping blank input to `None`.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// SQLite binds LIMIT as a signed integer; anything past `i64::MAX` means no limit.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
