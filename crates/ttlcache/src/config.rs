//! Cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Default period between expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of hits after which an entry is promoted
pub const DEFAULT_PROMOTION_THRESHOLD: u32 = 20;

/// Default bound of the promotion queue
pub const DEFAULT_PROMOTION_QUEUE_BOUND: usize = 1024;

const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Cache configuration.
///
/// Durations serialize as integer milliseconds:
///
/// ```json
/// { "ttl_ms": 5000, "max_size": 256, "sweep_interval_ms": 250 }
/// ```
///
/// Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live applied to every entry at insertion
    #[serde(rename = "ttl_ms", with = "millis")]
    pub ttl: Duration,
    /// Maximum number of resident entries
    pub max_size: usize,
    /// Period of the background expiry sweep
    #[serde(rename = "sweep_interval_ms", with = "millis")]
    pub sweep_interval: Duration,
    /// Hits an entry must exceed before it is moved to the protected end
    pub promotion_threshold: u32,
    /// Capacity of the promotion queue; requests beyond it are dropped
    pub promotion_queue_bound: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_size: DEFAULT_MAX_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            promotion_threshold: DEFAULT_PROMOTION_THRESHOLD,
            promotion_queue_bound: DEFAULT_PROMOTION_QUEUE_BOUND,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with the given TTL and defaults elsewhere
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    /// Set the maximum number of entries
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the sweep period
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the promotion threshold
    pub fn promotion_threshold(mut self, threshold: u32) -> Self {
        self.promotion_threshold = threshold;
        self
    }

    /// Set the promotion queue bound
    pub fn promotion_queue_bound(mut self, bound: usize) -> Self {
        self.promotion_queue_bound = bound;
        self
    }

    /// Reject configurations that would produce a useless or stalled cache
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::invalid_config("max_size must be greater than 0"));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::invalid_config(
                "sweep_interval must be greater than 0",
            ));
        }
        if self.promotion_threshold == 0 {
            return Err(CacheError::invalid_config(
                "promotion_threshold must be greater than 0",
            ));
        }
        if self.promotion_queue_bound == 0 {
            return Err(CacheError::invalid_config(
                "promotion_queue_bound must be greater than 0",
            ));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::new(Duration::from_millis(500));
        assert_eq!(config.ttl, Duration::from_millis(500));
        assert_eq!(config.max_size, 100);
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.promotion_threshold, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let config = CacheConfig::new(Duration::from_secs(1)).max_size(0);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let config = CacheConfig::new(Duration::from_secs(1)).sweep_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_promotion_settings_rejected() {
        let config = CacheConfig::new(Duration::from_secs(1))
            .promotion_threshold(0)
            .promotion_queue_bound(8);
        assert!(config.validate().is_err());

        let config = CacheConfig::new(Duration::from_secs(1)).promotion_queue_bound(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CacheConfig =
            serde_json::from_str(r#"{ "ttl_ms": 250, "max_size": 8 }"#).unwrap();
        assert_eq!(config.ttl, Duration::from_millis(250));
        assert_eq!(config.max_size, 8);
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert_eq!(config.promotion_queue_bound, DEFAULT_PROMOTION_QUEUE_BOUND);
    }

    #[test]
    fn test_serialize_millis() {
        let config = CacheConfig::new(Duration::from_secs(2)).max_size(4);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["ttl_ms"], 2000);
        assert_eq!(json["sweep_interval_ms"], 1000);
        assert_eq!(json["max_size"], 4);
    }
}
