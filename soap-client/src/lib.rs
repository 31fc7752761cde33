//! Private SOAP client for ONVIF device communication
//!
//! This crate provides a minimal SOAP 1.2 client specifically designed for
//! talking to ONVIF cameras: it writes envelopes carrying WS-Addressing and
//! WS-Security `UsernameToken` headers, hands them to a pluggable
//! [`Transport`], and extracts the expected response element from the reply.

mod envelope;
mod error;
mod security;
mod transport;

pub use envelope::{
    decode_response, extract_response, Envelope, BASE64_ENCODING_TYPE, PASSWORD_DIGEST_TYPE,
    SOAP_ENV_NS, WSA_NS, WSSE_NS, WSU_NS,
};
pub use error::SoapError;
pub use security::{
    password_digest, Clock, FixedClock, SystemClock, UsernameToken, UsernameTokenBuilder,
};
pub use transport::{
    Credentials, DigestChallenge, HttpRequest, Transport, TransportConfig, UreqTransport,
};

use std::sync::Arc;
use xmltree::Element;

/// A minimal SOAP client for ONVIF device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<UsernameTokenBuilder>,
}

impl SoapClient {
    /// Create a new SOAP client over the default `ureq` transport
    pub fn new() -> Self {
        Self::with_transport(Arc::new(UreqTransport::new()))
    }

    /// Create a SOAP client over a custom transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            tokens: Arc::new(UsernameTokenBuilder::new()),
        }
    }

    /// Replace the token builder, e.g. to inject a clock or a time offset
    pub fn with_token_builder(mut self, tokens: UsernameTokenBuilder) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    /// Send a SOAP request and return the parsed response element
    ///
    /// # Arguments
    /// * `url` - Where the HTTP request is posted
    /// * `credentials` - Used for the UsernameToken and HTTP digest auth
    /// * `action` - WS-Addressing action URI
    /// * `payload` - Body fragment, must be well-formed XML
    /// * `to` - Optional WS-Addressing destination
    /// * `response_name` - Local name of the expected body element
    pub fn call(
        &self,
        url: &str,
        credentials: &Credentials,
        action: &str,
        payload: &str,
        to: Option<&str>,
        response_name: &str,
    ) -> Result<Element, SoapError> {
        let token = (!credentials.is_empty())
            .then(|| self.tokens.build(&credentials.username, &credentials.password));

        let mut envelope = Envelope::new(payload).action(action);
        if let Some(token) = &token {
            envelope = envelope.security(token);
        }
        if let Some(to) = to {
            envelope = envelope.to(to);
        }

        let request = HttpRequest {
            url: url.to_string(),
            action: action.to_string(),
            body: envelope.encode()?,
            credentials: credentials.clone(),
        };

        tracing::debug!(url, action, "sending SOAP request");
        let xml_text = self.transport.exchange(&request)?;

        decode_response(&xml_text, response_name)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        reply: String,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl Transport for RecordingTransport {
        fn exchange(&self, request: &HttpRequest) -> Result<String, SoapError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    const REPLY: &str = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
        <s:Body><PingResponse><Ok>true</Ok></PingResponse></s:Body>
    </s:Envelope>"#;

    fn client(transport: Arc<RecordingTransport>) -> SoapClient {
        let at = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        SoapClient::with_transport(transport)
            .with_token_builder(UsernameTokenBuilder::with_clock(Arc::new(FixedClock(at))))
    }

    #[test]
    fn test_soap_client_creation() {
        let _client = SoapClient::new();
        let _default_client = SoapClient::default();
    }

    #[test]
    fn test_call_sends_security_and_destination() {
        let transport = Arc::new(RecordingTransport {
            reply: REPLY.to_string(),
            ..Default::default()
        });
        let credentials = Credentials::new("admin", "secret");

        let response = client(transport.clone())
            .call(
                "http://cam/onvif/event_service",
                &credentials,
                "urn:ping",
                "<Ping/>",
                Some("http://cam/sub/1"),
                "PingResponse",
            )
            .unwrap();

        assert_eq!(response.get_child("Ok").unwrap().get_text().unwrap(), "true");

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://cam/onvif/event_service");
        assert!(sent[0].body.contains("<Username>admin</Username>"));
        assert!(sent[0].body.contains("OXXdHj5PrwESibgGMebS68No3I4="));
        assert!(sent[0].body.contains("<wsa:To>http://cam/sub/1</wsa:To>"));
    }

    #[test]
    fn test_call_without_credentials_omits_security() {
        let transport = Arc::new(RecordingTransport {
            reply: REPLY.to_string(),
            ..Default::default()
        });

        client(transport.clone())
            .call(
                "http://cam/onvif/event_service",
                &Credentials::new("", ""),
                "urn:ping",
                "<Ping/>",
                None,
                "PingResponse",
            )
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert!(!sent[0].body.contains("Security"));
        assert!(!sent[0].body.contains("wsa:To"));
    }

    #[test]
    fn test_call_surfaces_missing_response() {
        let transport = Arc::new(RecordingTransport {
            reply: REPLY.to_string(),
            ..Default::default()
        });

        let result = client(transport).call(
            "http://cam/onvif/event_service",
            &Credentials::new("admin", "secret"),
            "urn:other",
            "<Other/>",
            None,
            "OtherResponse",
        );

        assert!(matches!(result, Err(SoapError::Parse(_))));
    }
}
