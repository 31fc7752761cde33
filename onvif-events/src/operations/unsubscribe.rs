//! Unsubscribe operation for a WS-BaseNotification subscription manager

use xmltree::Element;

use crate::error::ApiError;
use crate::operation::{EventOperation, WSNT_NS};

/// Unsubscribe operation
pub struct UnsubscribeOperation;

/// Unsubscribe has no parameters; the target is named by the `To` header
#[derive(Debug, Clone, Default)]
pub struct UnsubscribeRequest;

/// Unsubscribe returns an empty response element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnsubscribeResponse;

impl EventOperation for UnsubscribeOperation {
    type Request = UnsubscribeRequest;
    type Response = UnsubscribeResponse;

    const ACTION: &'static str =
        "http://docs.oasis-open.org/wsn/bw-2/SubscriptionManager/UnsubscribeRequest";
    const RESPONSE: &'static str = "UnsubscribeResponse";

    fn build_payload(_request: &Self::Request) -> String {
        format!(r#"<Unsubscribe xmlns="{}"/>"#, WSNT_NS)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(UnsubscribeResponse)
    }
}
