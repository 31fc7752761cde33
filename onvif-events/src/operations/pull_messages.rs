//! PullMessages operation for an ONVIF pull-point subscription

use std::time::Duration;

use chrono::{DateTime, Utc};
use xmltree::Element;

use crate::error::ApiError;
use crate::message::RawMessage;
use crate::operation::{child_text, xs_duration, EventOperation, EVENTS_NS};
use crate::subscription::parse_device_time;

/// PullMessages operation
pub struct PullMessagesOperation;

/// Request for PullMessages operation
#[derive(Debug, Clone)]
pub struct PullMessagesRequest {
    /// How long the device may hold the request open waiting for events
    pub timeout: Duration,
    /// Maximum number of messages returned per call
    pub message_limit: u32,
}

/// Response for PullMessages operation
#[derive(Debug, Clone, PartialEq)]
pub struct PullMessagesResponse {
    pub current_time: Option<DateTime<Utc>>,
    pub termination_time: Option<DateTime<Utc>>,
    /// Messages in the order the device listed them; empty when nothing happened.
    /// Notifications without a payload are left out.
    pub messages: Vec<RawMessage>,
}

impl EventOperation for PullMessagesOperation {
    type Request = PullMessagesRequest;
    type Response = PullMessagesResponse;

    const ACTION: &'static str =
        "http://www.onvif.org/ver10/events/wsdl/PullPointSubscription/PullMessagesRequest";
    const RESPONSE: &'static str = "PullMessagesResponse";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            r#"<PullMessages xmlns="{}"><Timeout>{}</Timeout><MessageLimit>{}</MessageLimit></PullMessages>"#,
            EVENTS_NS,
            xs_duration(request.timeout),
            request.message_limit
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        let messages = xml
            .children
            .iter()
            .filter_map(|node| node.as_element())
            .filter(|element| element.name == "NotificationMessage")
            .flat_map(RawMessage::from_notification)
            .collect();

        Ok(PullMessagesResponse {
            current_time: child_text(xml, "CurrentTime").as_deref().and_then(parse_device_time),
            termination_time: child_text(xml, "TerminationTime")
                .as_deref()
                .and_then(parse_device_time),
            messages,
        })
    }
}
