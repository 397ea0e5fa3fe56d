//! SQLite storage backend for tollgate rate-limit accounting.
//!
//! Provides [`SqliteAttemptLogRepository`], an implementation of
//! `tollgate_core::AttemptLogRepository` over a `sqlx::SqlitePool`, and the
//! migrations that create its schema.
//!
//! SQLite has no TTL index, so the retention horizon is enforced by
//! `purge_expired` (driven by the core service's purge task) rather than by
//! the store itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlx::SqlitePool;
//! use tollgate_storage_sqlite::{SqliteAttemptLogRepository, migrate};
//!
//! let pool = SqlitePool::connect("sqlite:tollgate.db").await?;
//! migrate(&pool).await?;
//! let repository = SqliteAttemptLogRepository::new(pool);
//! ```

pub mod migrations;
pub mod repositories;

pub use migrations::{MigrationError, SqliteMigrationManager, migrate};
pub use repositories::SqliteAttemptLogRepository;
