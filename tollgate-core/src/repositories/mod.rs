//! Repository traits for data access layer
//!
//! This module defines the repository interface that the accounting service
//! uses to interact with storage. The trait is a clean abstraction over the
//! underlying backend: implementations only need to answer append and
//! ordered-range queries over the attempt log.

pub mod attempt_log;

pub use attempt_log::AttemptLogRepository;
