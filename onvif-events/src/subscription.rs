//! Pull-point subscription state
//!
//! A subscription is the address the device told us to pull from plus a
//! locally tracked termination deadline. The deadline is derived from the
//! difference between the device's `TerminationTime` and `CurrentTime`, so a
//! camera whose clock is off does not make us resubscribe early or late.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Lifetime assumed when the device does not report usable times
pub const DEFAULT_TERMINATION: Duration = Duration::from_secs(180);

/// An active pull-point subscription
#[derive(Debug, Clone)]
pub struct Subscription {
    address: String,
    created_at: DateTime<Utc>,
    expires_at: Instant,
}

impl Subscription {
    /// Create a subscription that expires `lifetime` from now
    pub fn new(address: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            address: address.into(),
            created_at: Utc::now(),
            expires_at: Instant::now() + lifetime,
        }
    }

    /// Create a subscription from the times reported by the device
    pub fn from_device_times(
        address: impl Into<String>,
        current_time: Option<DateTime<Utc>>,
        termination_time: Option<DateTime<Utc>>,
        fallback: Duration,
    ) -> Self {
        let lifetime = remaining_lifetime(current_time, termination_time).unwrap_or(fallback);
        Self::new(address, lifetime)
    }

    /// Address pulls are sent to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Local wall-clock time the subscription was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Time left before the device drops the subscription
    pub fn time_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Move the deadline according to times reported in a later response
    ///
    /// Leaves the deadline untouched when the device did not report both times.
    pub fn refresh(
        &mut self,
        current_time: Option<DateTime<Utc>>,
        termination_time: Option<DateTime<Utc>>,
    ) {
        if let Some(lifetime) = remaining_lifetime(current_time, termination_time) {
            self.expires_at = Instant::now() + lifetime;
        }
    }
}

fn remaining_lifetime(
    current_time: Option<DateTime<Utc>>,
    termination_time: Option<DateTime<Utc>>,
) -> Option<Duration> {
    (termination_time? - current_time?).to_std().ok()
}

/// Parse an xs:dateTime as reported by the device
pub(crate) fn parse_device_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
