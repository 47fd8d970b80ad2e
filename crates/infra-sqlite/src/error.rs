// sqlx::Error -> AppError

use ingestq_core::error::AppError;

/// Every storage failure surfaces as `StoreUnavailable`; callers only need
/// to know the store could not serve the request.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "5" => AppError::StoreUnavailable(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                "13" => AppError::StoreUnavailable(format!("Database full: {}", db_err.message())),
                other => AppError::StoreUnavailable(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            },
            None => AppError::StoreUnavailable(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::PoolTimedOut => {
            AppError::StoreUnavailable("Timed out acquiring a connection".to_string())
        }
        sqlx::Error::PoolClosed => AppError::StoreUnavailable("Connection pool closed".to_string()),
        _ => AppError::StoreUnavailable(err.to_string()),
    }
}
