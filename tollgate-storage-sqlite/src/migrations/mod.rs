//! Schema migrations for the attempt log.
//!
//! The schema is an ordered list of versioned steps. Applied versions are
//! recorded in a `_tollgate_migrations` table, so running [`migrate`]
//! against an already-migrated database is a no-op.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One versioned schema step.
#[async_trait]
pub trait SqliteMigration: Send + Sync {
    /// Unique version, used for ordering and idempotency tracking.
    fn version(&self) -> i64;

    /// Human readable name, recorded alongside the version.
    fn name(&self) -> &str;

    /// Apply the step.
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    /// Undo the step.
    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;
}

const MIGRATION_TABLE: &str = "_tollgate_migrations";

/// Create the attempt log schema, applying any steps not yet run.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrationError> {
    let manager = SqliteMigrationManager::new(pool.clone());
    manager.initialize().await?;
    manager.up(&attempt_log_migrations()).await
}

fn attempt_log_migrations() -> Vec<Box<dyn SqliteMigration>> {
    vec![
        Box::new(CreateAttemptLogTable),
        Box::new(CreateAttemptLogIndexes),
    ]
}

/// Applies schema steps and tracks which versions have run.
pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the version tracking table if it does not exist.
    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply every step that has not run yet, in order.
    ///
    /// Each step commits together with its version record in one
    /// transaction, so a failed step leaves the tracking table unchanged.
    pub async fn up(&self, migrations: &[Box<dyn SqliteMigration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                continue;
            }

            tracing::info!(
                name = migration.name(),
                version = migration.version(),
                "Applying migration"
            );

            let mut tx = self.pool.begin().await?;
            migration.up(&mut tx).await?;
            sqlx::query(&format!(
                "INSERT INTO {MIGRATION_TABLE} (version, name) VALUES (?, ?)"
            ))
            .bind(migration.version())
            .bind(migration.name())
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
        }

        Ok(())
    }

    /// Undo every applied step, in the given order.
    pub async fn down(
        &self,
        migrations: &[Box<dyn SqliteMigration>],
    ) -> Result<(), MigrationError> {
        for migration in migrations {
            if !self.is_applied(migration.version()).await? {
                continue;
            }

            tracing::info!(
                name = migration.name(),
                version = migration.version(),
                "Rolling back migration"
            );

            let mut tx = self.pool.begin().await?;
            migration.down(&mut tx).await?;
            sqlx::query(&format!("DELETE FROM {MIGRATION_TABLE} WHERE version = ?"))
                .bind(migration.version())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let applied: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {MIGRATION_TABLE} WHERE version = ?)"
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(applied)
    }
}

pub struct CreateAttemptLogTable;

#[async_trait]
impl SqliteMigration for CreateAttemptLogTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateAttemptLogTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        // created_at is unix milliseconds: the rate-limit window is
        // millisecond-granular and reset times must be exact
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attempt_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identity TEXT NOT NULL,
                category TEXT NOT NULL,
                source_address TEXT,
                client_agent TEXT,
                succeeded INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            );"#,
        )
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS attempt_log")
            .execute(conn)
            .await?;

        Ok(())
    }
}

pub struct CreateAttemptLogIndexes;

#[async_trait]
impl SqliteMigration for CreateAttemptLogIndexes {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateAttemptLogIndexes"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        // Composite index covering the windowed lookup and the purge scan
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_attempt_log_identity_category_created_at
            ON attempt_log (identity, category, created_at);"#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_attempt_log_created_at
            ON attempt_log (created_at);"#,
        )
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP INDEX IF EXISTS idx_attempt_log_identity_category_created_at")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DROP INDEX IF EXISTS idx_attempt_log_created_at")
            .execute(conn)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create pool")
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = test_pool().await;
        migrate(&pool).await.expect("First migrate failed");
        migrate(&pool).await.expect("Second migrate failed");

        let manager = SqliteMigrationManager::new(pool.clone());
        assert!(manager.is_applied(1).await.unwrap());
        assert!(manager.is_applied(2).await.unwrap());

        // One tracking row per step, not per run
        let tracked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _tollgate_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(tracked, 2);
    }

    #[tokio::test]
    async fn test_failed_step_is_not_recorded() {
        let pool = test_pool().await;
        let manager = SqliteMigrationManager::new(pool.clone());
        manager.initialize().await.expect("Initialize failed");

        // Indexes before the table they target: the step fails and its
        // version must not be marked applied
        let out_of_order: Vec<Box<dyn SqliteMigration>> = vec![Box::new(CreateAttemptLogIndexes)];
        assert!(manager.up(&out_of_order).await.is_err());
        assert!(!manager.is_applied(2).await.unwrap());
    }

    #[tokio::test]
    async fn test_down_unwinds_migrations() {
        let pool = test_pool().await;
        migrate(&pool).await.expect("Migrate failed");

        let manager = SqliteMigrationManager::new(pool);
        let reversed: Vec<Box<dyn SqliteMigration>> = vec![
            Box::new(CreateAttemptLogIndexes),
            Box::new(CreateAttemptLogTable),
        ];
        manager.down(&reversed).await.expect("Down failed");

        assert!(!manager.is_applied(1).await.unwrap());
        assert!(!manager.is_applied(2).await.unwrap());
    }
}
