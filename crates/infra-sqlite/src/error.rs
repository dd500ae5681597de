// sqlx::Error -> AppError (orphan rule prevents a From impl here)

use catalog_sync_core::error::AppError;

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    let message = match &err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            describe_sqlite_error(code.as_deref(), db_err.message())
        }
        sqlx::Error::RowNotFound => "Row not found".to_string(),
        sqlx::Error::PoolTimedOut => "Timed out waiting for a pooled connection".to_string(),
        _ => err.to_string(),
    };
    AppError::Storage(message)
}

// Extended result codes: https://www.sqlite.org/rescode.html
fn describe_sqlite_error(code: Option<&str>, message: &str) -> String {
    match code {
        Some("2067" | "1555") => format!("Unique constraint violation: {}", message),
        Some("275") => format!("Check constraint violation: {}", message),
        Some("5" | "517") => format!("Database busy: {}", message),
        Some("13") => format!("Database full: {}", message),
        Some(code) => format!("Database error [{}]: {}", code, message),
        None => format!("Database error: {}", message),
    }
}

/// Product ids are stored as SQLite INTEGER
pub(crate) fn to_db_id(id: u64) -> i64 {
    id as i64
}

pub(crate) fn from_db_id(id: i64) -> u64 {
    id as u64
}
