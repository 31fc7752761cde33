//! Background polling worker
//!
//! The worker owns the subscription. It pulls, normalizes and hands each
//! recognition to the consumer over a rendezvous channel, so a slow consumer
//! holds back the next pull. Any failed pull moves it to resubscribing, which
//! retries with backoff until the camera accepts a new subscription.
//!
//! Cancellation is signalled by disconnecting the shutdown channel. Every
//! blocking point except the network exchange itself selects on it.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam::channel::{select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use onvif_events::{DeviceEndpoint, EventClient, Subscription};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::StreamConfig;
use crate::normalizer::normalize;
use crate::recognition::Recognition;

/// Lifecycle state of a stream worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WorkerState {
    /// Creating the initial subscription
    Subscribing,
    /// Pulling from an active subscription
    Polling,
    /// Subscription lost; retrying since the given time
    Resubscribing { since: DateTime<Utc> },
    /// Worker has exited
    Stopped,
}

/// Snapshot of a stream's health
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    pub state: WorkerState,
    /// Address currently pulled from
    pub subscription_address: Option<String>,
    /// Failed resubscribe attempts in the current outage
    pub consecutive_failures: u32,
    /// Set once `consecutive_failures` reaches the configured threshold
    pub degraded: bool,
    /// Successful resubscriptions since start
    pub resubscriptions: u64,
    /// Recognitions accepted by the consumer
    pub delivered: u64,
}

impl Default for StreamStatus {
    fn default() -> Self {
        Self {
            state: WorkerState::Subscribing,
            subscription_address: None,
            consecutive_failures: 0,
            degraded: false,
            resubscriptions: 0,
            delivered: 0,
        }
    }
}

pub(crate) type SharedStatus = Arc<RwLock<StreamStatus>>;

pub(crate) struct Worker {
    pub(crate) client: EventClient,
    pub(crate) device: DeviceEndpoint,
    pub(crate) config: StreamConfig,
    pub(crate) subscription: Subscription,
    pub(crate) events: Sender<Recognition>,
    pub(crate) shutdown: Receiver<()>,
    pub(crate) status: SharedStatus,
}

impl Worker {
    /// Run until cancelled or the consumer goes away
    pub(crate) fn run(mut self) {
        tracing::info!(device = %self.device.address(), "recognition worker started");
        self.set_polling();

        while self.poll_once().is_continue() {}

        if let Err(e) = self.client.unsubscribe(&self.device, &self.subscription) {
            tracing::debug!(
                address = %self.subscription.address(),
                "unsubscribe on shutdown failed: {}",
                e
            );
        }

        self.status.write().state = WorkerState::Stopped;
        tracing::info!(device = %self.device.address(), "recognition worker stopped");
    }

    fn poll_once(&mut self) -> ControlFlow<()> {
        if self.is_cancelled() {
            return ControlFlow::Break(());
        }

        if self.subscription.is_expired() {
            tracing::warn!(
                address = %self.subscription.address(),
                "subscription expired, resubscribing"
            );
            return self.resubscribe();
        }

        let started = Instant::now();
        match self.client.pull_messages(&self.device, &mut self.subscription) {
            Ok(messages) => {
                tracing::trace!(count = messages.len(), "pulled messages");
                for message in &messages {
                    if let Some(recognition) = normalize(message, started) {
                        self.emit(recognition)?;
                    }
                }
                ControlFlow::Continue(())
            }
            Err(e) => {
                if self.is_cancelled() {
                    return ControlFlow::Break(());
                }
                tracing::warn!(
                    address = %self.subscription.address(),
                    "pull failed, resubscribing: {}",
                    e
                );
                self.resubscribe()
            }
        }
    }

    /// Hand one recognition to the consumer, blocking until it is taken
    fn emit(&self, recognition: Recognition) -> ControlFlow<()> {
        tracing::debug!(plate = %recognition.plate, confidence = recognition.confidence, "recognition");
        select! {
            send(self.events, recognition) -> sent => match sent {
                Ok(()) => {
                    self.status.write().delivered += 1;
                    ControlFlow::Continue(())
                }
                Err(_) => {
                    tracing::debug!("recognition receiver dropped, shutting down worker");
                    ControlFlow::Break(())
                }
            },
            recv(self.shutdown) -> _ => ControlFlow::Break(()),
        }
    }

    fn resubscribe(&mut self) -> ControlFlow<()> {
        {
            let mut status = self.status.write();
            status.state = WorkerState::Resubscribing { since: Utc::now() };
        }

        let mut failures = 0u32;
        loop {
            if self.wait(self.config.next_delay(failures)) {
                return ControlFlow::Break(());
            }

            match self.client.create_subscription(&self.device) {
                Ok(subscription) => {
                    tracing::info!(
                        address = %subscription.address(),
                        attempts = failures + 1,
                        "resubscribed"
                    );
                    self.subscription = subscription;
                    self.status.write().resubscriptions += 1;
                    self.set_polling();
                    return ControlFlow::Continue(());
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let degraded = failures >= self.config.degraded_after;
                    tracing::warn!(failures, "resubscribe failed: {}", e);
                    if failures == self.config.degraded_after {
                        tracing::error!(
                            device = %self.device.address(),
                            "stream degraded after {} failed resubscribes",
                            failures
                        );
                    }

                    let mut status = self.status.write();
                    status.consecutive_failures = failures;
                    status.degraded = degraded;
                }
            }
        }
    }

    fn set_polling(&self) {
        let mut status = self.status.write();
        status.state = WorkerState::Polling;
        status.subscription_address = Some(self.subscription.address().to_string());
        status.consecutive_failures = 0;
        status.degraded = false;
    }

    /// Sleep for `delay`, returning true if cancelled meanwhile
    fn wait(&self, delay: Duration) -> bool {
        !matches!(
            self.shutdown.recv_timeout(delay),
            Err(RecvTimeoutError::Timeout)
        )
    }

    fn is_cancelled(&self) -> bool {
        !matches!(self.shutdown.try_recv(), Err(TryRecvError::Empty))
    }
}
