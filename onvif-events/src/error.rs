use soap_client::SoapError;
use thiserror::Error;

/// Protocol errors for ONVIF event operations
///
/// Every variant except `InvalidParameter` is a failure of one exchange with
/// the device; callers that keep a stream alive treat them all as a reason
/// to resubscribe.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// Connection failures, timeouts, unexpected HTTP statuses and rejected
    /// HTTP authentication all end up here.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response parsing error
    ///
    /// The device answered, but the envelope was malformed or did not have
    /// the structure the operation expects.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// SOAP fault returned by device
    #[error("SOAP fault {code}: {reason}")]
    SoapFault { code: String, reason: String },

    /// Subscription could not be used
    ///
    /// Returned when the device accepted a subscription request but handed
    /// back an unusable subscription reference.
    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    /// Invalid parameter value
    ///
    /// Malformed device addresses or request payloads that could not be encoded.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::NetworkError(msg),
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault { code, reason } => ApiError::SoapFault { code, reason },
            SoapError::Encode(msg) => ApiError::InvalidParameter(msg),
        }
    }
}
