//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error, including rejected authentication
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// Response XML was malformed or did not have the expected structure
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the device
    #[error("SOAP fault {code}: {reason}")]
    Fault { code: String, reason: String },

    /// Request envelope could not be written
    #[error("Envelope encoding error: {0}")]
    Encode(String),
}
