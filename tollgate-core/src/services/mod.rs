//! Service layer for business logic
//!
//! This module contains the accounting service that sits between the caller
//! (an authentication flow) and the repository layer.

pub mod rate_limit;

pub use rate_limit::RateLimitService;
