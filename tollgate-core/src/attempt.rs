//! Domain types for the attempt log.
//!
//! An [`AttemptRecord`] is one row in an append-only log: it is created once
//! when an attempt is observed and never updated. All accounting is derived
//! by re-reading the log, never from in-memory counters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The kind of sensitive action being rate limited.
///
/// This is a closed set: anything outside it is rejected at the parsing
/// boundary with [`ValidationError::InvalidCategory`] and never reaches the
/// store layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionCategory {
    ForgotPassword,
    LoginAttempt,
    Register,
}

impl ActionCategory {
    /// The wire/storage name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::ForgotPassword => "forgot-password",
            ActionCategory::LoginAttempt => "login-attempt",
            ActionCategory::Register => "register",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forgot-password" => Ok(ActionCategory::ForgotPassword),
            "login-attempt" => Ok(ActionCategory::LoginAttempt),
            "register" => Ok(ActionCategory::Register),
            other => Err(ValidationError::InvalidCategory(other.to_string())),
        }
    }
}

/// One logged attempt.
///
/// `identity` is always stored normalized (trimmed, lowercased); query paths
/// normalize their inputs identically so both sides hit the same bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub identity: String,
    pub category: ActionCategory,
    pub source_address: Option<String>,
    pub client_agent: Option<String>,
    pub succeeded: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for appending one attempt to the log.
///
/// The store assigns `id` and `created_at` at insertion time. Construction
/// goes through the service so `identity` arrives normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttempt {
    pub identity: String,
    pub category: ActionCategory,
    pub source_address: Option<String>,
    pub client_agent: Option<String>,
    pub succeeded: bool,
}

/// Point-in-time snapshot of an identity's standing in the current window.
///
/// This is a pure read: two concurrent callers can both observe
/// `allowed = true` and both go on to log an attempt. Nothing here
/// serializes check-then-act sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStatus {
    /// Whether one more attempt fits in the window.
    pub allowed: bool,
    /// Slots left before the threshold is reached.
    pub remaining: u32,
    /// When the oldest counted attempt ages out of the window, freeing one
    /// slot. With an empty window this is the hypothetical boundary one full
    /// window from now.
    pub reset_at: DateTime<Utc>,
}

impl WindowStatus {
    /// Seconds until `reset_at`, for Retry-After style responses.
    ///
    /// Returns `None` when the window is not exhausted or the reset moment
    /// has already passed.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        if self.allowed {
            return None;
        }
        let seconds = (self.reset_at - Utc::now()).num_seconds();
        (seconds > 0).then_some(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in [
            ActionCategory::ForgotPassword,
            ActionCategory::LoginAttempt,
            ActionCategory::Register,
        ] {
            assert_eq!(category.as_str().parse::<ActionCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_rejects_unknown() {
        let err = "password-reset".parse::<ActionCategory>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCategory(s) if s == "password-reset"));
    }

    #[test]
    fn test_category_serde_uses_wire_names() {
        let json = serde_json::to_string(&ActionCategory::ForgotPassword).unwrap();
        assert_eq!(json, "\"forgot-password\"");

        let parsed: ActionCategory = serde_json::from_str("\"login-attempt\"").unwrap();
        assert_eq!(parsed, ActionCategory::LoginAttempt);
    }

    #[test]
    fn test_retry_after_none_when_allowed() {
        let status = WindowStatus {
            allowed: true,
            remaining: 2,
            reset_at: Utc::now() + chrono::Duration::hours(1),
        };
        assert_eq!(status.retry_after_seconds(), None);
    }

    #[test]
    fn test_retry_after_when_exhausted() {
        let status = WindowStatus {
            allowed: false,
            remaining: 0,
            reset_at: Utc::now() + chrono::Duration::minutes(15),
        };
        let retry_after = status.retry_after_seconds().unwrap();
        assert!(retry_after > 890 && retry_after <= 900);
    }

    #[test]
    fn test_retry_after_none_when_reset_passed() {
        let status = WindowStatus {
            allowed: false,
            remaining: 0,
            reset_at: Utc::now() - chrono::Duration::seconds(5),
        };
        assert_eq!(status.retry_after_seconds(), None);
    }
}
