//! Relay configuration.

use std::time::Duration;

/// Floor applied to the retry interval. A zero-length timer would turn
/// backoff into a busy loop.
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_micros(100);

/// Configuration for a [`ConflatingRelay`](super::relay::ConflatingRelay).
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Wait after a failed non-blocking handoff before retrying (default: 1ms)
    pub retry_interval: Duration,
    /// Log phase transitions (default: true)
    pub log_transitions: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(1),
            log_transitions: true,
        }
    }
}

impl RelayConfig {
    /// Create a new config builder.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// Retry almost immediately. The consumer sees data sooner at the cost of
    /// more timer wakeups while it is busy.
    pub fn low_latency() -> Self {
        Self {
            retry_interval: MIN_RETRY_INTERVAL,
            ..Default::default()
        }
    }

    /// Retry rarely. Suited to consumers that take tens of milliseconds per
    /// value and producers that burst.
    pub fn low_overhead() -> Self {
        Self {
            retry_interval: Duration::from_millis(50),
            ..Default::default()
        }
    }

    /// Retry interval with the floor applied.
    pub(crate) fn effective_retry_interval(&self) -> Duration {
        self.retry_interval.max(MIN_RETRY_INTERVAL)
    }
}

/// Builder pattern for RelayConfig.
#[derive(Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    /// Set the retry interval.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    /// Set the retry interval in milliseconds.
    pub fn retry_interval_ms(mut self, interval: u64) -> Self {
        self.config.retry_interval = Duration::from_millis(interval);
        self
    }

    /// Enable or disable phase transition logging.
    pub fn log_transitions(mut self, enable: bool) -> Self {
        self.config.log_transitions = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RelayConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.retry_interval, Duration::from_millis(1));
        assert!(config.log_transitions);
    }

    #[test]
    fn test_builder() {
        let config = RelayConfig::builder()
            .retry_interval_ms(25)
            .log_transitions(false)
            .build();

        assert_eq!(config.retry_interval, Duration::from_millis(25));
        assert!(!config.log_transitions);
    }

    #[test]
    fn test_presets() {
        let fast = RelayConfig::low_latency();
        let slow = RelayConfig::low_overhead();
        assert!(fast.retry_interval < slow.retry_interval);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = RelayConfig::builder().retry_interval(Duration::ZERO).build();
        assert_eq!(config.effective_retry_interval(), MIN_RETRY_INTERVAL);

        let config = RelayConfig::builder().retry_interval_ms(10).build();
        assert_eq!(config.effective_retry_interval(), Duration::from_millis(10));
    }
}
