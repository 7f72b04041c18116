use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::utils::retry::RetryConfig;

/// Operational knobs for the engine. Scoring constants are part of the
/// algorithm contract and deliberately not configurable here.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// When true, `MasteryService::after_quiz` detaches the mastery update
    /// onto a background task instead of awaiting it, so quiz completion is
    /// never blocked on bookkeeping.
    pub detach_mastery_updates: bool,
    /// Retry budget for transient store failures per topic unit.
    pub store_retry_max_attempts: usize,
    pub store_retry_base_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detach_mastery_updates: true,
            store_retry_max_attempts: 5,
            store_retry_base_backoff_ms: 20,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;
        let defaults = Config::default();

        // The plain env var is the kill-switch and wins over any file value.
        let detach_mastery_updates = match env::var("MASTERY_DETACH_UPDATES") {
            Ok(v) => v != "0",
            Err(_) => settings
                .get_bool("mastery.detach_updates")
                .unwrap_or(defaults.detach_mastery_updates),
        };

        let store_retry_max_attempts = settings
            .get_int("store.retry_max_attempts")
            .map(|v| v.max(1) as usize)
            .unwrap_or(defaults.store_retry_max_attempts);

        let store_retry_base_backoff_ms = settings
            .get_int("store.retry_base_backoff_ms")
            .map(|v| v.max(0) as u64)
            .unwrap_or(defaults.store_retry_base_backoff_ms);

        Ok(Config {
            detach_mastery_updates,
            store_retry_max_attempts,
            store_retry_base_backoff_ms,
        })
    }

    /// Retry policy for the per-topic read-modify-write units.
    pub fn store_retry(&self) -> RetryConfig {
        let base = Duration::from_millis(self.store_retry_base_backoff_ms);
        RetryConfig {
            max_attempts: self.store_retry_max_attempts,
            base_backoff: base,
            max_backoff: base.saturating_mul(16).max(Duration::from_millis(1)),
            jitter_max: Some(base / 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn load_uses_defaults_without_sources() {
        env::remove_var("APP__MASTERY__DETACH_UPDATES");
        env::remove_var("MASTERY_DETACH_UPDATES");
        let config = Config::load().expect("load config");
        assert!(config.detach_mastery_updates);
        assert_eq!(config.store_retry_max_attempts, 5);
    }

    #[test]
    #[serial]
    fn env_flag_disables_detached_updates() {
        // config/dev.toml enables detaching; the env kill-switch must still
        // win over the file value.
        env::set_var("MASTERY_DETACH_UPDATES", "0");
        let config = Config::load().expect("load config");
        assert!(!config.detach_mastery_updates);
        env::remove_var("MASTERY_DETACH_UPDATES");
    }

    #[test]
    #[serial]
    fn env_flag_set_to_one_keeps_detached_updates() {
        env::set_var("MASTERY_DETACH_UPDATES", "1");
        let config = Config::load().expect("load config");
        assert!(config.detach_mastery_updates);
        env::remove_var("MASTERY_DETACH_UPDATES");
    }

    #[test]
    fn store_retry_reflects_settings() {
        let config = Config {
            store_retry_max_attempts: 3,
            store_retry_base_backoff_ms: 40,
            ..Config::default()
        };
        let retry = config.store_retry();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_backoff, Duration::from_millis(40));
    }
}
