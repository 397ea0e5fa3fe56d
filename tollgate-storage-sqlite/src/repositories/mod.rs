//! Repository implementations for SQLite storage

pub mod attempt_log;

pub use attempt_log::SqliteAttemptLogRepository;
