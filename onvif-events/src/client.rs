//! Client executing event operations against one camera

use std::time::Duration;

use soap_client::SoapClient;

use crate::device::DeviceEndpoint;
use crate::error::{ApiError, Result};
use crate::message::RawMessage;
use crate::operation::EventOperation;
use crate::operations::{
    CreatePullPointSubscriptionOperation, CreatePullPointSubscriptionRequest,
    PullMessagesOperation, PullMessagesRequest, UnsubscribeOperation, UnsubscribeRequest,
};
use crate::subscription::{Subscription, DEFAULT_TERMINATION};

/// Parameters sent with every subscription and pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSettings {
    /// Requested subscription lifetime (`InitialTerminationTime`)
    pub initial_termination: Duration,
    /// How long a pull may wait on the device for events
    pub pull_timeout: Duration,
    /// Maximum messages per pull
    pub message_limit: u32,
    /// Post pulls to the device event service instead of the subscription address
    ///
    /// Some firmware only accepts requests on the event service endpoint and
    /// dispatches on the `To` header. The `To` header is sent either way.
    pub route_via_device: bool,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            initial_termination: DEFAULT_TERMINATION,
            pull_timeout: Duration::from_secs(3),
            message_limit: 10,
            route_via_device: false,
        }
    }
}

/// A client for executing ONVIF event operations against a camera
///
/// Bridges the stateless operation definitions and the SOAP layer. Cheap to
/// clone; clones share the underlying transport.
///
/// ```rust,no_run
/// use onvif_events::{DeviceEndpoint, EventClient};
///
/// let device = DeviceEndpoint::new("http://192.168.1.64/onvif/event_service", "admin", "secret")?;
/// let client = EventClient::new();
///
/// let mut subscription = client.create_subscription(&device)?;
/// for message in client.pull_messages(&device, &mut subscription)? {
///     println!("{:?}", message.data_value("PlateNumber"));
/// }
/// client.unsubscribe(&device, &subscription)?;
/// # Ok::<(), onvif_events::ApiError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventClient {
    soap_client: SoapClient,
    settings: EventSettings,
}

impl EventClient {
    /// Create a client over the default HTTP transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client over a custom SOAP client, e.g. one with a scripted transport
    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self {
            soap_client,
            settings: EventSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EventSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &EventSettings {
        &self.settings
    }

    /// Execute an event operation
    ///
    /// # Arguments
    /// * `device` - Supplies the credentials
    /// * `url` - Where the request is posted
    /// * `to` - WS-Addressing destination, if the operation targets a subscription
    /// * `request` - The operation request data
    pub fn execute<Op: EventOperation>(
        &self,
        device: &DeviceEndpoint,
        url: &str,
        to: Option<&str>,
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let payload = Op::build_payload(request);

        let xml = self.soap_client.call(
            url,
            device.credentials(),
            Op::ACTION,
            &payload,
            to,
            Op::RESPONSE,
        )?;

        Op::parse_response(&xml)
    }

    /// Create a pull-point subscription on the device
    pub fn create_subscription(&self, device: &DeviceEndpoint) -> Result<Subscription> {
        let request = CreatePullPointSubscriptionRequest {
            initial_termination: self.settings.initial_termination,
        };

        let response = self.execute::<CreatePullPointSubscriptionOperation>(
            device,
            device.address(),
            None,
            &request,
        )?;

        tracing::debug!(
            address = %response.address,
            "created pull-point subscription"
        );

        Ok(Subscription::from_device_times(
            response.address,
            response.current_time,
            response.termination_time,
            self.settings.initial_termination,
        ))
    }

    /// Pull pending messages, refreshing the subscription deadline
    ///
    /// Returns an empty list when the pull timed out on the device without events.
    pub fn pull_messages(
        &self,
        device: &DeviceEndpoint,
        subscription: &mut Subscription,
    ) -> Result<Vec<RawMessage>> {
        if subscription.address().is_empty() {
            return Err(ApiError::SubscriptionError(
                "Subscription has no address".to_string(),
            ));
        }

        let request = PullMessagesRequest {
            timeout: self.settings.pull_timeout,
            message_limit: self.settings.message_limit,
        };

        let response = self.execute::<PullMessagesOperation>(
            device,
            self.pull_target(device, subscription),
            Some(subscription.address()),
            &request,
        )?;

        subscription.refresh(response.current_time, response.termination_time);
        Ok(response.messages)
    }

    /// Release the subscription on the device
    pub fn unsubscribe(&self, device: &DeviceEndpoint, subscription: &Subscription) -> Result<()> {
        self.execute::<UnsubscribeOperation>(
            device,
            self.pull_target(device, subscription),
            Some(subscription.address()),
            &UnsubscribeRequest,
        )?;
        Ok(())
    }

    fn pull_target<'a>(&self, device: &'a DeviceEndpoint, subscription: &'a Subscription) -> &'a str {
        if self.settings.route_via_device {
            device.address()
        } else {
            subscription.address()
        }
    }
}
