//! SQLite implementation of the attempt log repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tollgate_core::{
    Error,
    attempt::{ActionCategory, AttemptRecord, NewAttempt},
    error::StorageError,
    repositories::AttemptLogRepository,
};

/// SQLite repository over the `attempt_log` table.
///
/// Timestamps are stored as unix milliseconds so window arithmetic and
/// reset times stay exact. Identities arrive already normalized from the
/// core service.
pub struct SqliteAttemptLogRepository {
    pool: SqlitePool,
}

impl SqliteAttemptLogRepository {
    /// Create a new SQLite attempt log repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAttemptRow {
    id: i64,
    identity: String,
    category: String,
    source_address: Option<String>,
    client_agent: Option<String>,
    succeeded: bool,
    created_at: i64,
}

impl TryFrom<SqliteAttemptRow> for AttemptRecord {
    type Error = Error;

    fn try_from(row: SqliteAttemptRow) -> Result<Self, Self::Error> {
        let category = ActionCategory::from_str(&row.category)
            .map_err(|_| StorageError::Database(format!("Corrupt category: {}", row.category)))?;
        let created_at = DateTime::from_timestamp_millis(row.created_at).ok_or_else(|| {
            StorageError::Database(format!("Corrupt timestamp: {}", row.created_at))
        })?;

        Ok(AttemptRecord {
            id: row.id,
            identity: row.identity,
            category,
            source_address: row.source_address,
            client_agent: row.client_agent,
            succeeded: row.succeeded,
            created_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, identity, category, source_address, client_agent, succeeded, created_at";

#[async_trait]
impl AttemptLogRepository for SqliteAttemptLogRepository {
    async fn record_attempt(&self, attempt: &NewAttempt) -> Result<AttemptRecord, Error> {
        let now = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, SqliteAttemptRow>(
            r#"
            INSERT INTO attempt_log (identity, category, source_address, client_agent, succeeded, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, identity, category, source_address, client_agent, succeeded, created_at
            "#,
        )
        .bind(&attempt.identity)
        .bind(attempt.category.as_str())
        .bind(attempt.source_address.as_deref())
        .bind(attempt.client_agent.as_deref())
        .bind(attempt.succeeded)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record attempt");
            StorageError::Database("Failed to record attempt".to_string())
        })?;

        row.try_into()
    }

    async fn attempts_in_window(
        &self,
        identity: &str,
        category: ActionCategory,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, Error> {
        let rows = sqlx::query_as::<_, SqliteAttemptRow>(
            format!(
                r#"
            SELECT {SELECT_COLUMNS}
            FROM attempt_log
            WHERE identity = ? AND category = ? AND created_at >= ?
            ORDER BY created_at ASC
            LIMIT ?
            "#
            )
            .as_str(),
        )
        .bind(identity)
        .bind(category.as_str())
        .bind(since.timestamp_millis())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to query attempt window");
            StorageError::Database("Failed to query attempt window".to_string())
        })?;

        rows.into_iter().map(AttemptRecord::try_from).collect()
    }

    async fn recent_attempts(
        &self,
        identity: &str,
        category: ActionCategory,
        since: DateTime<Utc>,
    ) -> Result<Vec<AttemptRecord>, Error> {
        let rows = sqlx::query_as::<_, SqliteAttemptRow>(
            format!(
                r#"
            SELECT {SELECT_COLUMNS}
            FROM attempt_log
            WHERE identity = ? AND category = ? AND created_at >= ?
            ORDER BY created_at DESC
            "#
            )
            .as_str(),
        )
        .bind(identity)
        .bind(category.as_str())
        .bind(since.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to query recent attempts");
            StorageError::Database("Failed to query recent attempts".to_string())
        })?;

        rows.into_iter().map(AttemptRecord::try_from).collect()
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM attempt_log WHERE created_at < ?")
            .bind(before.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to purge expired attempts");
                StorageError::Database("Failed to purge expired attempts".to_string())
            })?;

        Ok(result.rows_affected())
    }
}
