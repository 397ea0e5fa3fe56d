//! Windowed rate-limit accounting service.
//!
//! This module implements sliding-window attempt accounting over an
//! append-only attempt log: given an identity and an action category, it
//! answers whether another attempt fits in the trailing window, how many
//! slots remain, and when the next slot frees up.
//!
//! # Features
//!
//! - Per-identity, per-category attempt tracking over a configurable window
//! - Exact reset-time derivation from the oldest counted attempt
//! - Full audit trail of attempts, successful and failed
//! - Background purge of records past the retention horizon
//! - Identity normalization so query and write paths share one bucket
//!
//! # Example
//!
//! ```rust,ignore
//! use tollgate_core::services::RateLimitService;
//! use tollgate_core::{ActionCategory, RateLimitConfig};
//!
//! let service = RateLimitService::new(repository, RateLimitConfig::default());
//!
//! // Check the window before the sensitive action
//! let status = service
//!     .check_window("user@example.com", ActionCategory::ForgotPassword)
//!     .await?;
//! if !status.allowed {
//!     // Tell the client when to retry (status.reset_at)
//! }
//!
//! // Record the attempt after the action concludes
//! service
//!     .log_attempt("user@example.com", ActionCategory::ForgotPassword, Some("192.0.2.1"), None, true)
//!     .await?;
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    Error,
    attempt::{ActionCategory, AttemptRecord, NewAttempt, WindowStatus},
    config::RateLimitConfig,
    repositories::AttemptLogRepository,
    validation::normalize_identity,
};

/// Service for windowed rate-limit accounting.
///
/// All state lives in the attempt log; every answer is recomputed from the
/// store on each call. There is no in-memory counter or cache, so multiple
/// service instances over the same store stay consistent and the store's
/// own record expiry remains the single source of truth.
///
/// # Concurrency
///
/// [`check_window`](Self::check_window) and
/// [`log_attempt`](Self::log_attempt) are independent store round-trips
/// with no ordering guarantee between them: two concurrent callers can both
/// observe `allowed = true` and both log, so the true attempt count can
/// exceed `max_attempts` by a small margin under concurrent load. This is
/// inherent to count-based windowing without a transactional increment at
/// the store layer and is deliberately not tightened here.
pub struct RateLimitService<R: AttemptLogRepository> {
    repository: Arc<R>,
    config: RateLimitConfig,
}

impl<R: AttemptLogRepository> RateLimitService<R> {
    /// Create a new RateLimitService.
    ///
    /// The configuration is validated on every operation, before any store
    /// call, so an invalid config surfaces as `Error::Validation` rather
    /// than bad storage traffic.
    pub fn new(repository: Arc<R>, config: RateLimitConfig) -> Self {
        Self { repository, config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check an identity's standing in the current window.
    ///
    /// Pure read: performs no mutation and is safe to call repeatedly. The
    /// result is a point-in-time snapshot; see the type-level concurrency
    /// note for the check-then-act caveat.
    ///
    /// # Algorithm
    ///
    /// Fetches at most `max_attempts` records at or after
    /// `now - window`, oldest first. The count against the threshold decides
    /// `allowed` and `remaining`; `reset_at` is the oldest fetched
    /// `created_at` plus the window (the moment that attempt ages out,
    /// freeing a slot), or `now + window` when the window is empty.
    pub async fn check_window(
        &self,
        identity: &str,
        category: ActionCategory,
    ) -> Result<WindowStatus, Error> {
        self.config.validate()?;
        let identity = normalize_identity(identity)?;

        let now = Utc::now();
        let window_start = now - self.config.window;
        let attempts = self
            .repository
            .attempts_in_window(&identity, category, window_start, self.config.max_attempts)
            .await?;

        let count = attempts.len() as u32;
        let reset_at = match attempts.first() {
            Some(oldest) => oldest.created_at + self.config.window,
            None => now + self.config.window,
        };

        Ok(WindowStatus {
            allowed: count < self.config.max_attempts,
            remaining: self.config.max_attempts.saturating_sub(count),
            reset_at,
        })
    }

    /// Record one attempt.
    ///
    /// Appends unconditionally: no dedup and no gating against
    /// [`check_window`](Self::check_window). Callers that want gating must
    /// check first and honor the returned status.
    ///
    /// # Arguments
    ///
    /// * `identity` - The identity performing the action (normalized before
    ///   storage)
    /// * `category` - Which sensitive action was attempted
    /// * `source_address` - Optional originating network address
    /// * `client_agent` - Optional originating client descriptor
    /// * `succeeded` - Outcome of the attempt
    pub async fn log_attempt(
        &self,
        identity: &str,
        category: ActionCategory,
        source_address: Option<&str>,
        client_agent: Option<&str>,
        succeeded: bool,
    ) -> Result<AttemptRecord, Error> {
        self.config.validate()?;
        let identity = normalize_identity(identity)?;

        let attempt = NewAttempt {
            identity,
            category,
            source_address: source_address.map(|s| s.to_string()),
            client_agent: client_agent.map(|s| s.to_string()),
            succeeded,
        };

        self.repository.record_attempt(&attempt).await
    }

    /// Fetch the audit trail for an identity over the default one-hour
    /// lookback, most recent first.
    pub async fn recent_attempts(
        &self,
        identity: &str,
        category: ActionCategory,
    ) -> Result<Vec<AttemptRecord>, Error> {
        self.recent_attempts_within(identity, category, 1).await
    }

    /// Fetch the audit trail for an identity over an explicit lookback,
    /// most recent first.
    ///
    /// Monitoring/audit read only; gating decisions go through
    /// [`check_window`](Self::check_window). Note the store's retention
    /// policy caps how far back records actually exist.
    pub async fn recent_attempts_within(
        &self,
        identity: &str,
        category: ActionCategory,
        lookback_hours: u32,
    ) -> Result<Vec<AttemptRecord>, Error> {
        self.config.validate()?;
        let identity = normalize_identity(identity)?;

        let since = Utc::now() - Duration::hours(i64::from(lookback_hours));
        self.repository
            .recent_attempts(&identity, category, since)
            .await
    }

    /// Start the background purge task.
    ///
    /// Spawns a task that periodically deletes records older than the
    /// retention horizon, standing in for a TTL index on backends without
    /// one. The purge is best-effort and never part of the read path: the
    /// window predicate alone bounds every accounting query.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - A watch receiver that signals when to stop the task
    ///
    /// # Returns
    ///
    /// A `JoinHandle` for the spawned task.
    pub fn start_purge_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let repository = Arc::clone(&self.repository);
        let retention = self.config.retention;

        // Purge runs hourly, matching the default retention horizon
        const PURGE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(PURGE_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = Utc::now() - retention;
                        match repository.purge_expired(before).await {
                            Ok(count) if count > 0 => {
                                tracing::info!(
                                    count = count,
                                    "Purged expired attempt records"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    "Failed to purge expired attempt records"
                                );
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down attempt log purge task");
                        break;
                    }
                }
            }
        })
    }
}
