//! Configuration types for recognition streams
//!
//! Controls the subscription parameters sent to the camera, the retry policy
//! used while resubscribing, and the timeouts of the default HTTP transport.

use std::time::Duration;

use onvif_events::{EventSettings, DEFAULT_TERMINATION};
use soap_client::TransportConfig;

use crate::error::{Result, StreamError};

/// Configuration for a recognition stream
///
/// By default resubscribe attempts back off exponentially, from 1 second
/// doubling up to 30 seconds. Use [`StreamConfig::fixed_retry`] for a plain
/// 1 second retry loop.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Requested subscription lifetime
    /// Default: 180 seconds
    pub initial_termination: Duration,

    /// How long one pull may wait on the camera
    /// Default: 3 seconds
    pub pull_timeout: Duration,

    /// Maximum notifications per pull
    /// Default: 10
    pub message_limit: u32,

    /// Post pulls to the event service address instead of the subscription address
    /// Default: false
    pub route_via_device: bool,

    /// Delay before the first resubscribe attempt
    /// Default: 1 second
    pub resubscribe_delay: Duration,

    /// Factor applied to the delay after each failed attempt
    /// Default: 2
    pub backoff_multiplier: u32,

    /// Upper bound for the resubscribe delay
    /// Default: 30 seconds
    pub max_resubscribe_delay: Duration,

    /// Consecutive failed resubscribes before the stream reports itself degraded
    /// Default: 5
    pub degraded_after: u32,

    /// Added to the token creation time for cameras with a skewed clock
    /// Default: zero
    pub clock_offset: chrono::Duration,

    /// Timeouts for the default HTTP transport
    pub transport: TransportConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            initial_termination: DEFAULT_TERMINATION,
            pull_timeout: Duration::from_secs(3),
            message_limit: 10,
            route_via_device: false,
            resubscribe_delay: Duration::from_secs(1),
            backoff_multiplier: 2,
            max_resubscribe_delay: Duration::from_secs(30),
            degraded_after: 5,
            clock_offset: chrono::Duration::zero(),
            transport: TransportConfig::default(),
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry every second forever without backing off
    pub fn fixed_retry() -> Self {
        Self {
            backoff_multiplier: 1,
            max_resubscribe_delay: Duration::from_secs(1),
            ..Default::default()
        }
    }

    /// Short delays for cameras on a local network and for tests
    pub fn fast() -> Self {
        Self {
            pull_timeout: Duration::from_secs(1),
            resubscribe_delay: Duration::from_millis(50),
            max_resubscribe_delay: Duration::from_millis(500),
            transport: TransportConfig {
                connect_timeout: Duration::from_secs(2),
                read_timeout: Duration::from_secs(4),
            },
            ..Default::default()
        }
    }

    pub fn with_initial_termination(mut self, lifetime: Duration) -> Self {
        self.initial_termination = lifetime;
        self
    }

    pub fn with_pull_timeout(mut self, timeout: Duration) -> Self {
        self.pull_timeout = timeout;
        self
    }

    pub fn with_message_limit(mut self, limit: u32) -> Self {
        self.message_limit = limit;
        self
    }

    pub fn with_route_via_device(mut self, enabled: bool) -> Self {
        self.route_via_device = enabled;
        self
    }

    /// Set the retry policy in one go
    pub fn with_backoff(mut self, initial: Duration, multiplier: u32, max: Duration) -> Self {
        self.resubscribe_delay = initial;
        self.backoff_multiplier = multiplier;
        self.max_resubscribe_delay = max;
        self
    }

    pub fn with_degraded_after(mut self, failures: u32) -> Self {
        self.degraded_after = failures;
        self
    }

    pub fn with_clock_offset(mut self, offset: chrono::Duration) -> Self {
        self.clock_offset = offset;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Delay before the next resubscribe attempt after `failures` failed ones
    pub fn next_delay(&self, failures: u32) -> Duration {
        let mut delay = self.resubscribe_delay;
        for _ in 0..failures {
            if delay >= self.max_resubscribe_delay || delay.is_zero() || self.backoff_multiplier <= 1 {
                break;
            }
            delay = delay.saturating_mul(self.backoff_multiplier);
        }
        delay.min(self.max_resubscribe_delay)
    }

    /// Settings forwarded to the event client
    pub fn event_settings(&self) -> EventSettings {
        EventSettings {
            initial_termination: self.initial_termination,
            pull_timeout: self.pull_timeout,
            message_limit: self.message_limit,
            route_via_device: self.route_via_device,
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.initial_termination < Duration::from_secs(1) {
            return Err(StreamError::InvalidConfig(
                "Initial termination must be at least one second".to_string(),
            ));
        }

        if self.pull_timeout < Duration::from_secs(1) {
            return Err(StreamError::InvalidConfig(
                "Pull timeout must be at least one second".to_string(),
            ));
        }

        if self.message_limit == 0 {
            return Err(StreamError::InvalidConfig(
                "Message limit must be greater than 0".to_string(),
            ));
        }

        if self.backoff_multiplier == 0 {
            return Err(StreamError::InvalidConfig(
                "Backoff multiplier must be at least 1".to_string(),
            ));
        }

        if self.resubscribe_delay > self.max_resubscribe_delay {
            return Err(StreamError::InvalidConfig(
                "Resubscribe delay must not exceed the maximum delay".to_string(),
            ));
        }

        if self.degraded_after == 0 {
            return Err(StreamError::InvalidConfig(
                "Degraded threshold must be greater than 0".to_string(),
            ));
        }

        if self.transport.read_timeout <= self.pull_timeout {
            return Err(StreamError::InvalidConfig(
                "Transport read timeout must exceed the pull timeout".to_string(),
            ));
        }

        Ok(())
    }
}
