//! HTTP transport for SOAP exchanges
//!
//! The [`Transport`] trait is the only thing the rest of the workspace knows
//! about the network. [`UreqTransport`] implements it over `ureq` and answers
//! HTTP Digest challenges (RFC 7616, MD5) transparently.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::SoapError;
use crate::security::{Clock, SystemClock};

/// Credentials for both WS-Security and HTTP authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether there is anything to authenticate with
    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A fully formed outgoing SOAP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Destination URL
    pub url: String,
    /// SOAP action URI, also advertised in the content type
    pub action: String,
    /// Envelope document
    pub body: String,
    pub credentials: Credentials,
}

impl HttpRequest {
    pub fn content_type(&self) -> String {
        format!(
            "application/soap+xml; charset=utf-8; action=\"{}\"",
            self.action
        )
    }
}

/// Performs one SOAP exchange, handling any HTTP authentication handshake
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send the request and return the final response body
    fn exchange(&self, request: &HttpRequest) -> Result<String, SoapError>;
}

/// Timeouts for [`UreqTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Default: 5 seconds
    pub connect_timeout: Duration,
    /// Must exceed the pull timeout requested from the device.
    /// Default: 10 seconds
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
        }
    }
}

/// `ureq` based transport with HTTP Digest support
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    clock: Arc<dyn Clock>,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    pub fn with_config(config: TransportConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(config.connect_timeout)
                .timeout_read(config.read_timeout)
                .build(),
            clock: Arc::new(SystemClock),
        }
    }

    fn post(
        &self,
        request: &HttpRequest,
        authorization: Option<&str>,
    ) -> Result<ureq::Response, ureq::Error> {
        let mut call = self
            .agent
            .post(&request.url)
            .set("Content-Type", &request.content_type());
        if let Some(authorization) = authorization {
            call = call.set("Authorization", authorization);
        }
        call.send_string(&request.body)
    }

    fn answer_challenge(
        &self,
        request: &HttpRequest,
        response: ureq::Response,
    ) -> Result<String, SoapError> {
        if request.credentials.is_empty() {
            return Err(SoapError::Network(
                "HTTP 401 Unauthorized and no credentials configured".to_string(),
            ));
        }

        let challenge = response
            .all("WWW-Authenticate")
            .into_iter()
            .find_map(DigestChallenge::parse)
            .ok_or_else(|| {
                SoapError::Network("HTTP 401 without a Digest challenge".to_string())
            })?;

        let url = Url::parse(&request.url).map_err(|e| SoapError::Network(e.to_string()))?;
        let uri = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let cnonce = format!("{:016x}", self.clock.now().timestamp_nanos_opt().unwrap_or(0));
        let authorization = challenge.authorization(&request.credentials, "POST", &uri, &cnonce);

        tracing::debug!(realm = %challenge.realm, "answering HTTP digest challenge");

        match self.post(request, Some(&authorization)) {
            Ok(response) => read_body(response),
            Err(ureq::Error::Status(401, _)) => Err(SoapError::Network(
                "HTTP digest authentication rejected".to_string(),
            )),
            Err(error) => error_body(error),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn exchange(&self, request: &HttpRequest) -> Result<String, SoapError> {
        match self.post(request, None) {
            Ok(response) => read_body(response),
            Err(ureq::Error::Status(401, response)) => self.answer_challenge(request, response),
            Err(error) => error_body(error),
        }
    }
}

fn read_body(response: ureq::Response) -> Result<String, SoapError> {
    response
        .into_string()
        .map_err(|e| SoapError::Network(e.to_string()))
}

/// Devices report SOAP faults with 400/500 statuses; hand those bodies to the
/// decoder so the fault itself is reported.
fn error_body(error: ureq::Error) -> Result<String, SoapError> {
    match error {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            if (status == 400 || status == 500) && body.contains("Fault") {
                Ok(body)
            } else {
                Err(SoapError::Network(format!("HTTP {}", status)))
            }
        }
        ureq::Error::Transport(transport) => Err(SoapError::Network(transport.to_string())),
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
    /// Whether the server offered `qop=auth`
    pub qop_auth: bool,
}

impl DigestChallenge {
    /// Parse a challenge header, returning `None` for non-Digest schemes
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, params) = header.split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut algorithm = None;
        let mut qop_auth = false;

        for (key, value) in split_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = Some(value),
                "qop" => qop_auth = value.split(',').any(|q| q.trim() == "auth"),
                _ => {}
            }
        }

        Some(Self {
            realm: realm?,
            nonce: nonce?,
            opaque,
            algorithm,
            qop_auth,
        })
    }

    /// Build the `Authorization` header value answering this challenge
    pub fn authorization(
        &self,
        credentials: &Credentials,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> String {
        const NC: &str = "00000001";

        let mut ha1 = md5_hex(&format!(
            "{}:{}:{}",
            credentials.username, self.realm, credentials.password
        ));
        let session = self
            .algorithm
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case("MD5-sess"));
        if session {
            ha1 = md5_hex(&format!("{}:{}:{}", ha1, self.nonce, cnonce));
        }
        let ha2 = md5_hex(&format!("{}:{}", method, uri));

        let response = if self.qop_auth {
            md5_hex(&format!(
                "{}:{}:{}:{}:auth:{}",
                ha1, self.nonce, NC, cnonce, ha2
            ))
        } else {
            md5_hex(&format!("{}:{}:{}", ha1, self.nonce, ha2))
        };

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
            credentials.username, self.realm, self.nonce, uri, response
        );
        if let Some(algorithm) = &self.algorithm {
            header.push_str(&format!(", algorithm={}", algorithm));
        }
        if self.qop_auth {
            header.push_str(&format!(", qop=auth, nc={}, cnonce=\"{}\"", NC, cnonce));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", opaque));
        }
        header
    }
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Split `key=value, key="quoted, value"` pairs
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while !rest.is_empty() {
        let Some((key, after)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().trim_start_matches(',').trim().to_string();
        let after = after.trim_start();

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
                None => (quoted.to_string(), ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim().to_string(), &after[end..]),
                None => (after.trim().to_string(), ""),
            }
        };

        pairs.push((key, value));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}
