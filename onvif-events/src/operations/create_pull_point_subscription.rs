//! CreatePullPointSubscription operation for the ONVIF event service

use std::time::Duration;

use chrono::{DateTime, Utc};
use xmltree::Element;

use crate::error::ApiError;
use crate::operation::{child_text, xs_duration, EventOperation, EVENTS_NS};
use crate::subscription::parse_device_time;

/// CreatePullPointSubscription operation
pub struct CreatePullPointSubscriptionOperation;

/// Request for CreatePullPointSubscription operation
#[derive(Debug, Clone)]
pub struct CreatePullPointSubscriptionRequest {
    /// Requested lifetime before the device drops the subscription
    pub initial_termination: Duration,
}

/// Response for CreatePullPointSubscription operation
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePullPointSubscriptionResponse {
    /// Subscription reference address to pull from
    pub address: String,
    pub current_time: Option<DateTime<Utc>>,
    pub termination_time: Option<DateTime<Utc>>,
}

impl EventOperation for CreatePullPointSubscriptionOperation {
    type Request = CreatePullPointSubscriptionRequest;
    type Response = CreatePullPointSubscriptionResponse;

    const ACTION: &'static str =
        "http://www.onvif.org/ver10/events/wsdl/EventPortType/CreatePullPointSubscriptionRequest";
    const RESPONSE: &'static str = "CreatePullPointSubscriptionResponse";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            r#"<CreatePullPointSubscription xmlns="{}"><InitialTerminationTime>{}</InitialTerminationTime></CreatePullPointSubscription>"#,
            EVENTS_NS,
            xs_duration(request.initial_termination)
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        let reference = xml.get_child("SubscriptionReference").ok_or_else(|| {
            ApiError::ParseError("Missing SubscriptionReference element".to_string())
        })?;

        let address = child_text(reference, "Address").unwrap_or_default();
        if address.is_empty() {
            return Err(ApiError::SubscriptionError(
                "Device returned an empty subscription address".to_string(),
            ));
        }

        Ok(CreatePullPointSubscriptionResponse {
            address,
            current_time: child_text(xml, "CurrentTime").as_deref().and_then(parse_device_time),
            termination_time: child_text(xml, "TerminationTime")
                .as_deref()
                .and_then(parse_device_time),
        })
    }
}
