//! Core windowed rate-limit accounting for the tollgate project
//!
//! This crate tracks timestamped attempts (logins, registrations, password
//! reset requests) in an append-only log and answers, per identity and
//! action category, whether another attempt fits in the trailing window,
//! how many slots remain, and when the window resets.
//!
//! The crate is storage-agnostic: backends implement
//! [`AttemptLogRepository`] and the [`RateLimitService`] derives every
//! answer from the log on each call. See [`AttemptRecord`] for the log row,
//! [`WindowStatus`] for the accounting snapshot, and [`RateLimitConfig`]
//! for thresholds.

pub mod attempt;
pub mod config;
pub mod error;
pub mod repositories;
pub mod services;
pub mod validation;

pub use attempt::{ActionCategory, AttemptRecord, NewAttempt, WindowStatus};
pub use config::RateLimitConfig;
pub use error::Error;
pub use repositories::AttemptLogRepository;
pub use services::RateLimitService;
