//! Consumer side of a recognition stream

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use onvif_events::{DeviceEndpoint, EventClient};
use parking_lot::{Mutex, RwLock};

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::recognition::Recognition;
use crate::worker::{SharedStatus, StreamStatus, Worker};

/// Cloneable handle for cancelling a stream and reading its status
///
/// Cancelling through any handle stops the worker. Handles stay valid after
/// the stream is gone.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    shutdown: Arc<Mutex<Option<Sender<()>>>>,
    status: SharedStatus,
}

impl StreamHandle {
    /// Stop the worker; idempotent
    pub fn cancel(&self) {
        if self.shutdown.lock().take().is_some() {
            tracing::debug!("recognition stream cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.lock().is_none()
    }

    pub fn status(&self) -> StreamStatus {
        self.status.read().clone()
    }
}

/// A continuous stream of recognitions from one camera
///
/// Recognitions are delivered in the order the camera reported them. The
/// worker waits for each one to be received before pulling again. Dropping
/// the stream cancels it.
///
/// ```rust,no_run
/// use hikrec::{start_recognition_stream, DeviceEndpoint};
///
/// let device = DeviceEndpoint::new("http://192.168.1.64/onvif/event_service", "admin", "secret")?;
/// let stream = start_recognition_stream(device)?;
///
/// for recognition in stream {
///     println!("{} ({}%)", recognition.plate, recognition.confidence);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct RecognitionStream {
    receiver: Receiver<Recognition>,
    handle: StreamHandle,
    worker: Option<JoinHandle<()>>,
}

impl RecognitionStream {
    /// Subscribe and spawn the worker
    ///
    /// Only a failure of this first subscription is reported; later ones are
    /// retried by the worker.
    pub(crate) fn start(
        client: EventClient,
        device: DeviceEndpoint,
        config: StreamConfig,
    ) -> Result<Self> {
        let status: SharedStatus = Arc::new(RwLock::new(StreamStatus::default()));

        let subscription = client.create_subscription(&device)?;
        tracing::info!(
            device = %device.address(),
            address = %subscription.address(),
            "subscribed to camera events"
        );

        let (event_tx, event_rx) = channel::bounded(0);
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);

        let name = format!("hikrec-{}", device.host().unwrap_or_default());
        let worker = Worker {
            client,
            device,
            config,
            subscription,
            events: event_tx,
            shutdown: shutdown_rx,
            status: status.clone(),
        };

        let join = thread::Builder::new()
            .name(name)
            .spawn(move || worker.run())
            .map_err(|e| StreamError::Spawn(e.to_string()))?;

        Ok(Self {
            receiver: event_rx,
            handle: StreamHandle {
                shutdown: Arc::new(Mutex::new(Some(shutdown_tx))),
                status,
            },
            worker: Some(join),
        })
    }

    /// Block until the next recognition
    ///
    /// Returns `None` once the worker has stopped.
    pub fn recv(&self) -> Option<Recognition> {
        self.receiver.recv().ok()
    }

    /// Take a recognition if the worker is currently offering one
    pub fn try_recv(&self) -> Option<Recognition> {
        self.receiver.try_recv().ok()
    }

    /// Block until the next recognition or timeout expires
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Recognition> {
        self.receiver.recv_timeout(timeout).ok()
    }

    pub fn status(&self) -> StreamStatus {
        self.handle.status()
    }

    /// A handle that can cancel the stream from another thread
    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Cancel and wait for the worker to exit
    ///
    /// The worker finishes an in-flight exchange and sends `Unsubscribe`
    /// before exiting, so this can block for up to the transport timeouts.
    pub fn join(mut self) {
        self.handle.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("recognition worker panicked");
            }
        }
    }
}

impl Iterator for RecognitionStream {
    type Item = Recognition;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl Drop for RecognitionStream {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
