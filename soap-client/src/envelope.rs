//! SOAP 1.2 envelope encoding and decoding
//!
//! Requests are written with a structured XML writer so every string placed
//! in the header (action, destination, credentials) is escaped. The caller's
//! body fragment is re-emitted event by event, which also rejects malformed
//! fragments before anything reaches the network.

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use xmltree::Element;

use crate::error::SoapError;
use crate::security::UsernameToken;

pub const SOAP_ENV_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const WSA_NS: &str = "http://www.w3.org/2005/08/addressing";
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
pub const PASSWORD_DIGEST_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
pub const BASE64_ENCODING_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// An outgoing SOAP envelope
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    action: Option<&'a str>,
    to: Option<&'a str>,
    security: Option<&'a UsernameToken>,
    body: &'a str,
}

impl<'a> Envelope<'a> {
    /// Start an envelope wrapping the given body fragment
    pub fn new(body: &'a str) -> Self {
        Self {
            action: None,
            to: None,
            security: None,
            body,
        }
    }

    /// Set the WS-Addressing `Action` header
    pub fn action(mut self, action: &'a str) -> Self {
        self.action = Some(action);
        self
    }

    /// Set the WS-Addressing `To` header
    pub fn to(mut self, to: &'a str) -> Self {
        self.to = Some(to);
        self
    }

    /// Attach a WS-Security UsernameToken
    pub fn security(mut self, token: &'a UsernameToken) -> Self {
        self.security = Some(token);
        self
    }

    /// Write the complete envelope document
    pub fn encode(&self) -> Result<String, SoapError> {
        let mut writer = Writer::new(Vec::new());
        self.write(&mut writer)
            .map_err(|e| SoapError::Encode(e.to_string()))?;

        String::from_utf8(writer.into_inner()).map_err(|e| SoapError::Encode(e.to_string()))
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> quick_xml::Result<()> {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("s:Envelope");
        root.push_attribute(("xmlns:s", SOAP_ENV_NS));
        root.push_attribute(("xmlns:wsa", WSA_NS));
        let root_end = root.to_end().into_owned();
        writer.write_event(Event::Start(root))?;

        let header = BytesStart::new("s:Header");
        let header_end = header.to_end().into_owned();
        writer.write_event(Event::Start(header))?;

        if let Some(action) = self.action {
            let mut element = BytesStart::new("Action");
            element.push_attribute(("s:mustUnderstand", "1"));
            element.push_attribute(("xmlns", WSA_NS));
            write_text_element(writer, element, action)?;
        }

        if let Some(token) = self.security {
            write_security(writer, token)?;
        }

        if let Some(to) = self.to {
            write_text_element(writer, BytesStart::new("wsa:To"), to)?;
        }

        writer.write_event(Event::End(header_end))?;

        let body = BytesStart::new("s:Body");
        let body_end = body.to_end().into_owned();
        writer.write_event(Event::Start(body))?;
        copy_fragment(writer, self.body)?;
        writer.write_event(Event::End(body_end))?;

        writer.write_event(Event::End(root_end))
    }
}

fn write_security(writer: &mut Writer<Vec<u8>>, token: &UsernameToken) -> quick_xml::Result<()> {
    let mut security = BytesStart::new("Security");
    security.push_attribute(("s:mustUnderstand", "1"));
    security.push_attribute(("xmlns", WSSE_NS));
    let security_end = security.to_end().into_owned();
    writer.write_event(Event::Start(security))?;

    let username_token = BytesStart::new("UsernameToken");
    let username_token_end = username_token.to_end().into_owned();
    writer.write_event(Event::Start(username_token))?;

    write_text_element(writer, BytesStart::new("Username"), &token.username)?;

    let mut password = BytesStart::new("Password");
    password.push_attribute(("Type", PASSWORD_DIGEST_TYPE));
    write_text_element(writer, password, &token.password_digest)?;

    let mut nonce = BytesStart::new("Nonce");
    nonce.push_attribute(("EncodingType", BASE64_ENCODING_TYPE));
    write_text_element(writer, nonce, &token.nonce)?;

    let mut created = BytesStart::new("Created");
    created.push_attribute(("xmlns", WSU_NS));
    write_text_element(writer, created, &token.created)?;

    writer.write_event(Event::End(username_token_end))?;
    writer.write_event(Event::End(security_end))
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    text: &str,
) -> quick_xml::Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))
}

/// Re-emit a body fragment, dropping inter-element whitespace
fn copy_fragment(writer: &mut Writer<Vec<u8>>, fragment: &str) -> quick_xml::Result<()> {
    let mut reader = Reader::from_str(fragment);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Eof => return Ok(()),
            Event::Decl(_) => continue,
            event => writer.write_event(event)?,
        }
    }
}

/// Parse a response document and extract the expected body element
pub fn decode_response(xml: &str, response_name: &str) -> Result<Element, SoapError> {
    let envelope = Element::parse(xml.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;
    extract_response(&envelope, response_name)
}

/// Extract the named response element from a parsed envelope
///
/// Elements are matched by local name so any namespace prefix the device
/// chooses is accepted.
pub fn extract_response(envelope: &Element, response_name: &str) -> Result<Element, SoapError> {
    if envelope.name != "Envelope" {
        return Err(SoapError::Parse(format!(
            "Expected SOAP Envelope, found {}",
            envelope.name
        )));
    }

    let body = envelope
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        return Err(decode_fault(fault));
    }

    body.get_child(response_name)
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

fn decode_fault(fault: &Element) -> SoapError {
    // SOAP 1.2 nests the code under Code/Value and the reason under Reason/Text;
    // some firmware still answers with SOAP 1.1 faultcode/faultstring.
    let code = fault
        .get_child("Code")
        .and_then(|c| {
            c.get_child("Subcode")
                .and_then(|s| s.get_child("Value"))
                .or_else(|| c.get_child("Value"))
        })
        .or_else(|| fault.get_child("faultcode"))
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let reason = fault
        .get_child("Reason")
        .and_then(|r| r.get_child("Text"))
        .or_else(|| fault.get_child("faultstring"))
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    SoapError::Fault { code, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> UsernameToken {
        UsernameToken {
            username: "admin".to_string(),
            password_digest: "OXXdHj5PrwESibgGMebS68No3I4=".to_string(),
            nonce: "MTcwMDAwMDAwMDAwMDAwMDAwMA==".to_string(),
            created: "2023-11-14T22:13:20Z".to_string(),
        }
    }

    const BODY: &str = r#"<PullMessages xmlns="http://www.onvif.org/ver10/events/wsdl">
            <Timeout>PT3S</Timeout>
            <MessageLimit>10</MessageLimit>
        </PullMessages>"#;

    #[test]
    fn test_encode_full_envelope() {
        let token = token();
        let xml = Envelope::new(BODY)
            .action("http://www.onvif.org/ver10/events/wsdl/PullPointSubscription/PullMessagesRequest")
            .security(&token)
            .to("http://10.0.0.5/onvif/Events/PullSubManager_1")
            .encode()
            .unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:wsa="http://www.w3.org/2005/08/addressing">"#
        ));
        assert!(xml.contains(
            r#"<Action s:mustUnderstand="1" xmlns="http://www.w3.org/2005/08/addressing">http://www.onvif.org/ver10/events/wsdl/PullPointSubscription/PullMessagesRequest</Action>"#
        ));
        assert!(xml.contains(&format!(
            r#"<Security s:mustUnderstand="1" xmlns="{}"><UsernameToken><Username>admin</Username>"#,
            WSSE_NS
        )));
        assert!(xml.contains(&format!(
            r#"<Password Type="{}">OXXdHj5PrwESibgGMebS68No3I4=</Password>"#,
            PASSWORD_DIGEST_TYPE
        )));
        assert!(xml.contains(&format!(
            r#"<Nonce EncodingType="{}">MTcwMDAwMDAwMDAwMDAwMDAwMA==</Nonce>"#,
            BASE64_ENCODING_TYPE
        )));
        assert!(xml.contains(&format!(
            r#"<Created xmlns="{}">2023-11-14T22:13:20Z</Created>"#,
            WSU_NS
        )));
        assert!(xml.contains("<wsa:To>http://10.0.0.5/onvif/Events/PullSubManager_1</wsa:To>"));
        assert!(xml.contains(
            r#"<s:Body><PullMessages xmlns="http://www.onvif.org/ver10/events/wsdl"><Timeout>PT3S</Timeout><MessageLimit>10</MessageLimit></PullMessages></s:Body>"#
        ));
        assert!(xml.ends_with("</s:Envelope>"));
    }

    #[test]
    fn test_encoded_envelope_is_well_formed() {
        let token = token();
        let xml = Envelope::new(BODY)
            .action("urn:action")
            .security(&token)
            .to("http://cam/sub")
            .encode()
            .unwrap();

        let root = Element::parse(xml.as_bytes()).unwrap();
        assert_eq!(root.name, "Envelope");
        assert_eq!(root.namespace.as_deref(), Some(SOAP_ENV_NS));

        let header = root.get_child("Header").unwrap();
        let security = header.get_child("Security").unwrap();
        assert_eq!(security.namespace.as_deref(), Some(WSSE_NS));
        let to = header.get_child("To").unwrap();
        assert_eq!(to.namespace.as_deref(), Some(WSA_NS));

        let pull = root.get_child("Body").unwrap().get_child("PullMessages").unwrap();
        assert_eq!(pull.get_child("MessageLimit").unwrap().get_text().unwrap(), "10");
    }

    #[test]
    fn test_optional_headers_are_omitted() {
        let xml = Envelope::new("<Ping/>").encode().unwrap();

        assert!(!xml.contains("Action"));
        assert!(!xml.contains("Security"));
        assert!(!xml.contains("wsa:To"));
        assert!(xml.contains("<s:Header></s:Header>"));
        assert!(xml.contains("<s:Body><Ping/></s:Body>"));
    }

    #[test]
    fn test_user_strings_are_escaped() {
        let mut token = token();
        token.username = "ad<min>&".to_string();
        let xml = Envelope::new("<Ping/>")
            .security(&token)
            .to("http://cam/sub?a=1&b=</wsa:To>")
            .encode()
            .unwrap();

        assert!(xml.contains("<Username>ad&lt;min&gt;&amp;</Username>"));
        assert!(xml.contains("<wsa:To>http://cam/sub?a=1&amp;b=&lt;/wsa:To&gt;</wsa:To>"));

        let root = Element::parse(xml.as_bytes()).unwrap();
        let to = root.get_child("Header").unwrap().get_child("To").unwrap();
        assert_eq!(to.get_text().unwrap(), "http://cam/sub?a=1&b=</wsa:To>");
    }

    #[test]
    fn test_malformed_body_fragment_is_rejected() {
        let result = Envelope::new("<Open></Close>").encode();
        assert!(matches!(result, Err(SoapError::Encode(_))));
    }

    #[test]
    fn test_decode_response_with_prefixes() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                          xmlns:tev="http://www.onvif.org/ver10/events/wsdl">
                <env:Header/>
                <env:Body>
                    <tev:PullMessagesResponse>
                        <tev:CurrentTime>2024-05-01T10:00:00Z</tev:CurrentTime>
                    </tev:PullMessagesResponse>
                </env:Body>
            </env:Envelope>"#;

        let response = decode_response(xml, "PullMessagesResponse").unwrap();
        assert_eq!(response.name, "PullMessagesResponse");
        assert!(response.get_child("CurrentTime").is_some());
    }

    #[test]
    fn test_decode_soap12_fault() {
        let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                                   xmlns:ter="http://www.onvif.org/ver10/error">
                <env:Body>
                    <env:Fault>
                        <env:Code>
                            <env:Value>env:Sender</env:Value>
                            <env:Subcode><env:Value>ter:NotAuthorized</env:Value></env:Subcode>
                        </env:Code>
                        <env:Reason><env:Text xml:lang="en">Sender not Authorized</env:Text></env:Reason>
                    </env:Fault>
                </env:Body>
            </env:Envelope>"#;

        match decode_response(xml, "PullMessagesResponse") {
            Err(SoapError::Fault { code, reason }) => {
                assert_eq!(code, "ter:NotAuthorized");
                assert_eq!(reason, "Sender not Authorized");
            }
            other => panic!("Expected SoapError::Fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_response_element() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body/></s:Envelope>"#;

        match decode_response(xml, "CreatePullPointSubscriptionResponse") {
            Err(SoapError::Parse(msg)) => {
                assert!(msg.contains("Missing CreatePullPointSubscriptionResponse element"))
            }
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed_xml() {
        let result = decode_response("<s:Envelope><s:Body>", "PullMessagesResponse");
        assert!(matches!(result, Err(SoapError::Parse(_))));
    }

    #[test]
    fn test_decode_rejects_non_envelope_root() {
        let result = decode_response("<html><body>404</body></html>", "PullMessagesResponse");
        match result {
            Err(SoapError::Parse(msg)) => assert!(msg.contains("Expected SOAP Envelope")),
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }
}
