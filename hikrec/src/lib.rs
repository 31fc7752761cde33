//! License-plate recognitions from ONVIF cameras as a blocking stream
//!
//! `hikrec` subscribes to a camera's pull-point event service, pulls
//! recognition notifications, normalizes them into [`Recognition`] records and
//! hands them to the caller one at a time. Lost subscriptions are recreated in
//! the background with exponential backoff; the consumer only ever sees
//! recognitions.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hikrec::prelude::*;
//!
//! let device = DeviceEndpoint::new("http://192.168.1.64/onvif/event_service", "admin", "secret")?;
//! let stream = start_recognition_stream(device)?;
//! let handle = stream.handle();
//!
//! for recognition in stream {
//!     println!("{} {:?} {}%", recognition.plate, recognition.direction, recognition.confidence);
//!     if handle.status().degraded {
//!         eprintln!("camera unreachable for a while");
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Crate Layout
//!
//! - `soap_client`: WS-Security SOAP envelopes and the HTTP digest transport
//! - `onvif_events`: typed pull-point operations
//! - this crate: normalization, the polling worker and the consumer stream

use std::sync::Arc;

use soap_client::{SoapClient, Transport, UreqTransport, UsernameTokenBuilder};

pub mod config;
pub mod error;
pub mod logging;
pub mod normalizer;
pub mod recognition;
pub mod stream;
pub mod worker;

pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use normalizer::normalize;
pub use recognition::{Direction, IdentifiedRecognition, Recognition};
pub use stream::{RecognitionStream, StreamHandle};
pub use worker::{StreamStatus, WorkerState};

pub use onvif_events::{ApiError, DeviceEndpoint, EventClient, RawMessage, SimpleItem};
pub use soap_client::TransportConfig;

/// Start a stream with the default configuration and HTTP transport
pub fn start_recognition_stream(device: DeviceEndpoint) -> Result<RecognitionStream> {
    let config = StreamConfig::default();
    let transport = Arc::new(UreqTransport::with_config(config.transport.clone()));
    start_recognition_stream_with(device, config, transport)
}

/// Start a stream with a custom configuration and transport
///
/// `config.transport` is ignored here; it only applies to the default transport.
pub fn start_recognition_stream_with(
    device: DeviceEndpoint,
    config: StreamConfig,
    transport: Arc<dyn Transport>,
) -> Result<RecognitionStream> {
    config.validate()?;

    let soap_client = SoapClient::with_transport(transport)
        .with_token_builder(UsernameTokenBuilder::new().time_offset(config.clock_offset));
    let client = EventClient::with_soap_client(soap_client).with_settings(config.event_settings());

    RecognitionStream::start(client, device, config)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        start_recognition_stream, start_recognition_stream_with, DeviceEndpoint, Direction,
        IdentifiedRecognition, Recognition, RecognitionStream, StreamConfig, StreamError,
        StreamHandle, StreamStatus,
    };
}
