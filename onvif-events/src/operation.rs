//! Operation framework for ONVIF event actions

use std::time::Duration;

use xmltree::Element;

use crate::error::ApiError;

/// ONVIF events WSDL namespace
pub const EVENTS_NS: &str = "http://www.onvif.org/ver10/events/wsdl";

/// WS-BaseNotification namespace
pub const WSNT_NS: &str = "http://docs.oasis-open.org/wsn/b-2";

/// Base trait for all event operations
///
/// Each operation is a stateless marker type tying together the action URI,
/// the request payload and the parser for the matching response element.
pub trait EventOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// WS-Addressing action URI
    const ACTION: &'static str;

    /// Local name of the body element the device answers with
    const RESPONSE: &'static str;

    /// Build the body fragment for the SOAP envelope
    fn build_payload(request: &Self::Request) -> String;

    /// Parse the response element into the typed response
    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError>;
}

/// Format a duration as an xs:duration with second precision, e.g. `PT180S`
pub fn xs_duration(duration: Duration) -> String {
    format!("PT{}S", duration.as_secs())
}

/// Trimmed text content of a direct child element
pub(crate) fn child_text(xml: &Element, name: &str) -> Option<String> {
    xml.get_child(name)
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
}
