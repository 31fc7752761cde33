//! Camera endpoint configuration

use std::fmt;

use soap_client::Credentials;
use url::Url;

use crate::error::{ApiError, Result};

/// One camera: its ONVIF event service address and credentials
///
/// Immutable once constructed. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    address: String,
    credentials: Credentials,
}

impl DeviceEndpoint {
    /// Create an endpoint, validating that the address is an http(s) URL
    ///
    /// # Example
    /// ```rust
    /// use onvif_events::DeviceEndpoint;
    ///
    /// let device = DeviceEndpoint::new(
    ///     "http://192.168.1.64/onvif/event_service",
    ///     "admin",
    ///     "secret",
    /// ).unwrap();
    /// assert_eq!(device.host(), Some("192.168.1.64".to_string()));
    /// ```
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let address = address.into();
        let url = Url::parse(&address)
            .map_err(|e| ApiError::InvalidParameter(format!("Invalid device address '{}': {}", address, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ApiError::InvalidParameter(format!(
                "Unsupported scheme '{}' in device address",
                url.scheme()
            )));
        }

        Ok(Self {
            address,
            credentials: Credentials::new(username, password),
        })
    }

    /// The event service URL subscriptions are created against
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Host part of the address, for logging
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.address)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }
}

impl fmt::Debug for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceEndpoint")
            .field("address", &self.address)
            .field("username", &self.credentials.username)
            .finish_non_exhaustive()
    }
}
