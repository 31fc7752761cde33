//! WS-Security UsernameToken generation
//!
//! ONVIF devices authenticate SOAP requests with a `UsernameToken` carrying a
//! password digest instead of the clear-text password:
//!
//! ```text
//! digest = base64(sha1(nonce ++ created ++ password))
//! ```
//!
//! The nonce is the decimal nanosecond timestamp of the clock reading. Its
//! decimal string feeds the digest while its base64 form goes on the wire.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sha1::{Digest, Sha1};

/// Source of the current time for token generation
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A generated UsernameToken, ready to be written into a Security header
#[derive(Clone, PartialEq, Eq)]
pub struct UsernameToken {
    pub username: String,
    /// Base64 SHA-1 password digest
    pub password_digest: String,
    /// Base64 of the decimal nonce
    pub nonce: String,
    /// RFC 3339 creation timestamp
    pub created: String,
}

impl fmt::Debug for UsernameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernameToken")
            .field("username", &self.username)
            .field("nonce", &self.nonce)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

/// Compute the WS-Security password digest for the given token inputs
pub fn password_digest(nonce: &str, created: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce.as_bytes());
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Builds UsernameTokens from an injected clock
///
/// Each builder keeps its own record of the last nonce it handed out, so two
/// tokens from the same builder never share a nonce even when the clock does
/// not advance between calls.
#[derive(Debug)]
pub struct UsernameTokenBuilder {
    clock: Arc<dyn Clock>,
    time_offset: Duration,
    last_nonce: AtomicI64,
}

impl UsernameTokenBuilder {
    /// Create a builder reading the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a builder reading the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            time_offset: Duration::zero(),
            last_nonce: AtomicI64::new(i64::MIN),
        }
    }

    /// Shift the `Created` timestamp, for devices whose clock runs ahead or behind
    pub fn time_offset(mut self, offset: Duration) -> Self {
        self.time_offset = offset;
        self
    }

    /// Generate a token for the given credentials
    pub fn build(&self, username: &str, password: &str) -> UsernameToken {
        let now = self.clock.now();
        let nonce = self.next_nonce(now.timestamp_nanos_opt().unwrap_or(i64::MAX));
        let nonce = nonce.to_string();

        let created = (now + self.time_offset).to_rfc3339_opts(SecondsFormat::Secs, true);

        UsernameToken {
            username: username.to_string(),
            password_digest: password_digest(&nonce, &created, password),
            nonce: STANDARD.encode(nonce.as_bytes()),
            created,
        }
    }

    fn next_nonce(&self, candidate: i64) -> i64 {
        let previous = self
            .last_nonce
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(candidate.max(last.saturating_add(1)))
            })
            .unwrap_or(i64::MIN);
        candidate.max(previous.saturating_add(1))
    }
}

impl Default for UsernameTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
