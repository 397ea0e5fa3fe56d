//! Rate limit configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Configuration for windowed rate-limit accounting.
///
/// Thresholds travel in an explicit validated structure rather than as loose
/// per-call parameters, so a bad threshold or window is caught once at
/// configuration time instead of on every store query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Attempts permitted inside one window.
    pub max_attempts: u32,
    /// Length of the trailing window over which attempts are counted.
    #[serde(with = "duration_millis")]
    pub window: Duration,
    /// Horizon after which the store is free to expire records. Reads never
    /// assume a record survives past this; expiry is best-effort and may lag.
    #[serde(with = "duration_millis")]
    pub retention: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::hours(1),
            retention: Duration::hours(1),
        }
    }
}

impl RateLimitConfig {
    /// Create a config with an explicit threshold and window, keeping the
    /// retention horizon equal to the window.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            retention: window,
        }
    }

    /// Check the configuration before it is handed to a service.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts(self.max_attempts));
        }
        if self.window <= Duration::zero() {
            return Err(ValidationError::InvalidWindow);
        }
        if self.retention <= Duration::zero() {
            return Err(ValidationError::InvalidRetention);
        }
        Ok(())
    }
}

mod duration_millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Ok(Duration::milliseconds(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.window, Duration::hours(1));
        assert_eq!(config.retention, Duration::hours(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let config = RateLimitConfig::new(0, Duration::hours(1));
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMaxAttempts(0))
        ));
    }

    #[test]
    fn test_non_positive_window_rejected() {
        let config = RateLimitConfig::new(3, Duration::zero());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidWindow)
        ));

        let config = RateLimitConfig::new(3, Duration::milliseconds(-1));
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidWindow)
        ));
    }

    #[test]
    fn test_non_positive_retention_rejected() {
        let config = RateLimitConfig {
            retention: Duration::zero(),
            ..RateLimitConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRetention)
        ));
    }

    #[test]
    fn test_serde_round_trip_in_millis() {
        let config = RateLimitConfig::new(5, Duration::milliseconds(90_000));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("90000"));

        let parsed: RateLimitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
