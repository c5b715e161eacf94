//! Configuration for the cache layer

use crate::error::{CacheError, Result};
use std::time::Duration;
use tracing::warn;

/// Smallest TTL the key-value service accepts for cache entries
pub const MIN_TTL_SECONDS: u64 = 60;

/// TTL used when nothing is configured
pub const DEFAULT_TTL_SECONDS: u64 = 60;

/// Key prefix shared by the version tag and all cache entries
pub const DEFAULT_NAMESPACE: &str = "tasks:cache";

/// Environment variable overriding the entry TTL (whole seconds)
pub const TTL_ENV_VAR: &str = "TASKS_CACHE_TTL_SECONDS";

/// Environment variable toggling the cache ("false"/"0" disables it)
pub const ENABLED_ENV_VAR: &str = "TASKS_CACHE_ENABLED";

/// How read-through writes are performed after a miss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// The put completes before the response is returned
    #[default]
    Inline,
    /// The put is spawned onto the runtime; its outcome is only logged
    Background,
}

/// Configuration for the read-through cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Prefix for every key this layer writes
    pub namespace: String,

    /// Time-to-live for cached list/read results
    /// Never below [`MIN_TTL_SECONDS`]
    pub ttl: Duration,

    /// Upward-only TTL jitter factor (0.0 - 1.0)
    /// Spreads expiry of entries written at the same moment
    pub ttl_jitter: f64,

    /// Inline or fire-and-forget cache writes
    pub write_mode: WriteMode,

    /// When false the wrappers delegate straight to the record store
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            ttl_jitter: 0.0,
            write_mode: WriteMode::Inline,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Read TTL and enablement from the process environment.
    ///
    /// Unset values fall back to defaults. An unparsable TTL falls back to
    /// the default and a TTL below the floor is raised to the floor, both
    /// with a warning.
    pub fn from_env() -> Self {
        let ttl = std::env::var(TTL_ENV_VAR).ok();
        let enabled = std::env::var(ENABLED_ENV_VAR).ok();
        Self::from_values(ttl.as_deref(), enabled.as_deref())
    }

    pub(crate) fn from_values(ttl: Option<&str>, enabled: Option<&str>) -> Self {
        let mut builder = CacheConfig::builder();

        if let Some(raw) = ttl {
            match raw.trim().parse::<u64>() {
                Ok(secs) => {
                    if secs < MIN_TTL_SECONDS {
                        warn!(
                            "{}={} is below the {}s minimum; using {}s",
                            TTL_ENV_VAR, secs, MIN_TTL_SECONDS, MIN_TTL_SECONDS
                        );
                    }
                    builder = builder.ttl_seconds(secs);
                }
                Err(_) => warn!(
                    "{}={:?} is not a whole number of seconds; using {}s",
                    TTL_ENV_VAR, raw, DEFAULT_TTL_SECONDS
                ),
            }
        }

        if let Some(raw) = enabled {
            let on = !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
            builder = builder.enabled(on);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(CacheError::Config("namespace must not be empty".to_string()));
        }

        if self.ttl < Duration::from_secs(MIN_TTL_SECONDS) {
            return Err(CacheError::Config(format!(
                "ttl must be at least {}s",
                MIN_TTL_SECONDS
            )));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(CacheError::Config(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whole-second TTL to apply to the next cache write, jitter included
    pub fn ttl_seconds_for_write(&self) -> u64 {
        let base = self.ttl.as_secs().max(MIN_TTL_SECONDS);
        if self.ttl_jitter <= 0.0 {
            return base;
        }

        let extra = (base as f64 * self.ttl_jitter * rand::random::<f64>()).floor() as u64;
        base.saturating_add(extra)
    }

    /// [`ttl_seconds_for_write`](Self::ttl_seconds_for_write) as a `Duration`
    pub fn ttl_for_write(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds_for_write())
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    namespace: Option<String>,
    ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    write_mode: Option<WriteMode>,
    enabled: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set the key namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the entry TTL; clamped up to [`MIN_TTL_SECONDS`] on build
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl_seconds(self, secs: u64) -> Self {
        self.ttl(Duration::from_secs(secs))
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = Some(mode);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();
        let floor = Duration::from_secs(MIN_TTL_SECONDS);

        CacheConfig {
            namespace: self.namespace.unwrap_or(defaults.namespace),
            ttl: self.ttl.unwrap_or(defaults.ttl).max(floor),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            write_mode: self.write_mode.unwrap_or(defaults.write_mode),
            enabled: self.enabled.unwrap_or(defaults.enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.namespace, "tasks:cache");
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.write_mode, WriteMode::Inline);
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps_ttl_to_floor() {
        let config = CacheConfig::builder().ttl_seconds(5).build();
        assert_eq!(config.ttl, Duration::from_secs(MIN_TTL_SECONDS));

        let config = CacheConfig::builder().ttl_seconds(300).build();
        assert_eq!(config.ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = CacheConfig::default();
        invalid.namespace = String::new();
        assert!(invalid.validate().is_err());

        let mut invalid = CacheConfig::default();
        invalid.ttl = Duration::from_secs(10);
        assert!(invalid.validate().is_err());

        let invalid = CacheConfig::builder().ttl_jitter(1.5).build();
        assert!(matches!(invalid.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_ttl_for_write_without_jitter() {
        let config = CacheConfig::builder().ttl_seconds(120).build();
        assert_eq!(config.ttl_seconds_for_write(), 120);
        assert_eq!(config.ttl_for_write(), Duration::from_secs(120));
    }

    #[test]
    fn test_ttl_jitter_never_lowers_ttl() {
        let config = CacheConfig::builder()
            .ttl_seconds(100)
            .ttl_jitter(0.5)
            .build();

        for _ in 0..100 {
            let ttl = config.ttl_seconds_for_write();
            assert!((100..=150).contains(&ttl));
        }
    }

    #[test]
    fn test_jittered_ttl_saturates() {
        let config = CacheConfig::builder()
            .ttl_seconds(u64::MAX)
            .ttl_jitter(1.0)
            .build();
        assert_eq!(config.ttl_seconds_for_write(), u64::MAX);
    }

    #[test]
    fn test_from_values() {
        let config = CacheConfig::from_values(None, None);
        assert_eq!(config.ttl, Duration::from_secs(DEFAULT_TTL_SECONDS));
        assert!(config.enabled);

        let config = CacheConfig::from_values(Some("600"), Some("true"));
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert!(config.enabled);

        let config = CacheConfig::from_values(Some("30"), Some("false"));
        assert_eq!(config.ttl, Duration::from_secs(MIN_TTL_SECONDS));
        assert!(!config.enabled);

        let config = CacheConfig::from_values(Some("soon"), Some("0"));
        assert_eq!(config.ttl, Duration::from_secs(DEFAULT_TTL_SECONDS));
        assert!(!config.enabled);
    }
}
