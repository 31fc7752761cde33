//! Typed ONVIF event service API
//!
//! This crate exposes the three pull-point operations a recognition stream
//! needs (`CreatePullPointSubscription`, `PullMessages` and `Unsubscribe`) as
//! stateless [`EventOperation`] types, plus an [`EventClient`] that executes
//! them through the private `soap-client` crate.
//!
//! # Subscription lifecycle
//!
//! ```rust,no_run
//! use onvif_events::{DeviceEndpoint, EventClient};
//!
//! let device = DeviceEndpoint::new("http://192.168.1.64/onvif/event_service", "admin", "secret")?;
//! let client = EventClient::new();
//!
//! let mut subscription = client.create_subscription(&device)?;
//! while !subscription.is_expired() {
//!     for message in client.pull_messages(&device, &mut subscription)? {
//!         println!("{:?}", message.data);
//!     }
//! }
//! # Ok::<(), onvif_events::ApiError>(())
//! ```
//!
//! Every failed exchange surfaces as an [`ApiError`]; nothing here retries.

pub mod client;
pub mod device;
pub mod error;
pub mod message;
pub mod operation;
pub mod operations;
pub mod subscription;

pub use client::{EventClient, EventSettings};
pub use device::DeviceEndpoint;
pub use error::{ApiError, Result};
pub use message::{RawMessage, SimpleItem};
pub use operation::{xs_duration, EventOperation};
pub use subscription::{Subscription, DEFAULT_TERMINATION};

pub use soap_client::{Credentials, SoapClient, Transport};
