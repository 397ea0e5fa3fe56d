//! Repository trait for the attempt log.
//!
//! This module defines the storage interface for recording attempts and
//! answering the windowed queries the accounting service needs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    attempt::{ActionCategory, AttemptRecord, NewAttempt},
};

/// Repository over the append-only attempt log.
///
/// Implementations back a single logical table of [`AttemptRecord`] rows,
/// indexed on `(identity, category, created_at)` so the windowed queries
/// stay cheap. Rows are never updated; deletion happens only through
/// [`purge_expired`](AttemptLogRepository::purge_expired) or a store-native
/// retention policy such as a TTL index.
///
/// # Security Considerations
///
/// - Attempts should be recorded for all identities, even ones with no
///   matching account, to prevent user enumeration attacks.
/// - The store may expire rows past the retention horizon at any time, so
///   callers must never assume a complete historical record beyond it.
/// - Source addresses stored for auditing may be subject to data retention
///   regulations.
#[async_trait]
pub trait AttemptLogRepository: Send + Sync + 'static {
    /// Append one attempt to the log.
    ///
    /// The store assigns the row id and `created_at` timestamp. The caller
    /// supplies an already-normalized identity; this method performs no
    /// gating or dedup.
    async fn record_attempt(&self, attempt: &NewAttempt) -> Result<AttemptRecord, Error>;

    /// Fetch attempts for `(identity, category)` inside a trailing window.
    ///
    /// Returns rows with `created_at >= since`, ordered ascending by
    /// `created_at` (oldest first), capped at `limit` rows. The cap bounds
    /// query cost no matter how many attempts actually occurred: the service
    /// only needs the count up to its threshold and the oldest timestamp in
    /// that bounded set.
    async fn attempts_in_window(
        &self,
        identity: &str,
        category: ActionCategory,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, Error>;

    /// Fetch all attempts for `(identity, category)` since a cutoff, ordered
    /// descending by `created_at` (most recent first).
    ///
    /// This is the audit/monitoring read; it is never used for gating.
    async fn recent_attempts(
        &self,
        identity: &str,
        category: ActionCategory,
        since: DateTime<Utc>,
    ) -> Result<Vec<AttemptRecord>, Error>;

    /// Delete rows with `created_at` before the given cutoff.
    ///
    /// Retention enforcement hook for backends without a native TTL
    /// mechanism. Backends that expire rows themselves may implement this as
    /// a no-op returning 0.
    ///
    /// # Returns
    ///
    /// The number of rows deleted.
    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, Error>;
}
