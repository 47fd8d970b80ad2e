// SQLite StatusStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use ingestq_core::domain::StatusRecord;
use ingestq_core::error::Result;
use ingestq_core::port::{StatusStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Records live in `status_records` as JSON text, one row per key.
pub struct SqliteStatusStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteStatusStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

/// Escape LIKE wildcards so the prefix matches literally (`ESCAPE '\'`)
fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn get(&self, key: &str) -> Result<Option<StatusRecord>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM status_records WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, record: &StatusRecord) -> Result<()> {
        let value = serde_json::to_string(record)?;
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            INSERT INTO status_records (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(key = %key, status = %record.status, "Status record written");
        Ok(())
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"SELECT key FROM status_records WHERE key LIKE ? ESCAPE '\' ORDER BY key"#,
        )
        .bind(like_prefix_pattern(prefix))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}
