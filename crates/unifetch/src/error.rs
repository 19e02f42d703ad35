//! HTTP error types

use std::fmt;

use thiserror::Error;

use crate::config::ResolvedRequest;

/// Sentinel reported as the error code when no HTTP status was observed
pub const CONNECTION_ABORTED: &str = "ECONNABORTED";

/// Raw failure causes produced by the transports before normalization
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// HTTP error with status code
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Request cancelled through its cancellation token
    #[error("Request aborted")]
    Aborted,
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Request build error (invalid url, header, body)
    #[error("Request build error: {0}")]
    Build(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl HttpError {
    /// HTTP status observed when the failure happened, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure was caused by cancellation or timeout
    pub fn is_aborted(&self) -> bool {
        matches!(self, HttpError::Timeout | HttpError::Aborted)
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if let Some(status) = err.status() {
            HttpError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_connect() || err.is_request() {
            HttpError::Connection(err.to_string())
        } else if err.is_decode() {
            HttpError::Serialization(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

impl From<bitreq::Error> for HttpError {
    fn from(err: bitreq::Error) -> Self {
        use std::io;

        use bitreq::Error;

        match err {
            Error::InvalidUtf8InBody(_) => HttpError::Serialization(err.to_string()),
            Error::InvalidUtf8InResponse => HttpError::Serialization(err.to_string()),
            Error::IoError(io_err) => {
                if io_err.kind() == io::ErrorKind::TimedOut {
                    HttpError::Timeout
                } else if io_err.kind() == io::ErrorKind::ConnectionRefused
                    || io_err.kind() == io::ErrorKind::ConnectionReset
                    || io_err.kind() == io::ErrorKind::ConnectionAborted
                    || io_err.kind() == io::ErrorKind::NotConnected
                {
                    HttpError::Connection(io_err.to_string())
                } else {
                    HttpError::Other(io_err.to_string())
                }
            }
            Error::AddressNotFound => HttpError::Connection(err.to_string()),
            _ => HttpError::Other(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::Build(format!("Invalid url: {}", err))
    }
}

/// Error code carried by a [`NormalizedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// HTTP status observed on the response
    Status(u16),
    /// No response was received
    ConnectionAborted,
}

impl ErrorCode {
    /// The HTTP status, if this code carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorCode::Status(status) => Some(*status),
            ErrorCode::ConnectionAborted => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Status(status) => write!(f, "{}", status),
            ErrorCode::ConnectionAborted => f.write_str(CONNECTION_ABORTED),
        }
    }
}

/// Failure of a single request, in the one shape every transport converges on
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (code {code})")]
pub struct NormalizedError {
    /// Human readable description of the failure
    pub message: String,
    /// HTTP status if one was observed, else [`ErrorCode::ConnectionAborted`]
    pub code: ErrorCode,
    /// Configuration in effect when the request failed
    pub config: Box<ResolvedRequest>,
    /// True only when the request was cancelled (timeout or explicit abort)
    pub is_aborted: bool,
}

/// Conversion of any failure shape into a [`NormalizedError`]
///
/// Normalizing an already normalized error returns it unchanged, including
/// the configuration it was first normalized with.
pub trait Normalize {
    /// Collapse `self` into a [`NormalizedError`] for the given request
    fn normalize(self, config: &ResolvedRequest) -> NormalizedError;
}

impl Normalize for HttpError {
    fn normalize(self, config: &ResolvedRequest) -> NormalizedError {
        let code = self
            .status()
            .map(ErrorCode::Status)
            .unwrap_or(ErrorCode::ConnectionAborted);

        NormalizedError {
            message: self.to_string(),
            code,
            config: Box::new(config.clone()),
            is_aborted: self.is_aborted(),
        }
    }
}

impl Normalize for NormalizedError {
    fn normalize(self, _config: &ResolvedRequest) -> NormalizedError {
        self
    }
}

impl Normalize for reqwest::Error {
    fn normalize(self, config: &ResolvedRequest) -> NormalizedError {
        HttpError::from(self).normalize(config)
    }
}

impl Normalize for bitreq::Error {
    fn normalize(self, config: &ResolvedRequest) -> NormalizedError {
        HttpError::from(self).normalize(config)
    }
}

/// Errors returned by the request facade
#[derive(Debug, Error)]
pub enum Error {
    /// No transport is registered under the configured adapter name
    #[error("Adapter not found: {0}")]
    AdapterNotFound(String),
    /// The request was dispatched and failed
    #[error(transparent)]
    Request(#[from] NormalizedError),
}

impl Error {
    /// The normalized failure, if the request reached a transport
    pub fn as_normalized(&self) -> Option<&NormalizedError> {
        match self {
            Error::Request(err) => Some(err),
            Error::AdapterNotFound(_) => None,
        }
    }

    /// Whether the request was aborted by timeout or cancellation
    pub fn is_aborted(&self) -> bool {
        self.as_normalized().is_some_and(|err| err.is_aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, RequestConfig};

    fn resolved() -> ResolvedRequest {
        ClientConfig::default().resolve("https://api.example.com/items", RequestConfig::default())
    }

    #[test]
    fn test_http_error_status_display() {
        let error = HttpError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(format!("{}", error), "HTTP error (404): Not Found");
    }

    #[test]
    fn test_http_error_connection_display() {
        let error = HttpError::Connection("connection refused".to_string());
        assert_eq!(format!("{}", error), "Connection error: connection refused");
    }

    #[test]
    fn test_http_error_timeout_display() {
        let error = HttpError::Timeout;
        assert_eq!(format!("{}", error), "Request timeout");
    }

    #[test]
    fn test_from_serde_json_error() {
        let result: Result<String, _> = serde_json::from_str("not valid json");
        let json_error = result.expect_err("Invalid JSON should produce an error");
        let http_error: HttpError = json_error.into();

        match http_error {
            HttpError::Serialization(msg) => {
                assert!(
                    msg.contains("expected"),
                    "Error message should describe JSON error"
                );
            }
            _ => panic!("Expected HttpError::Serialization"),
        }
    }

    #[test]
    fn test_normalize_status_keeps_code() {
        let config = resolved();
        let normalized = HttpError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
        .normalize(&config);

        assert_eq!(normalized.code, ErrorCode::Status(503));
        assert!(!normalized.is_aborted);
        assert_eq!(*normalized.config, config);
    }

    #[test]
    fn test_normalize_connection_uses_sentinel() {
        let normalized = HttpError::Connection("refused".to_string()).normalize(&resolved());

        assert_eq!(normalized.code, ErrorCode::ConnectionAborted);
        assert_eq!(normalized.code.to_string(), CONNECTION_ABORTED);
        assert!(!normalized.is_aborted);
    }

    #[test]
    fn test_normalize_timeout_and_abort_are_aborted() {
        assert!(HttpError::Timeout.normalize(&resolved()).is_aborted);
        assert!(HttpError::Aborted.normalize(&resolved()).is_aborted);
        assert_eq!(
            HttpError::Aborted.normalize(&resolved()).code,
            ErrorCode::ConnectionAborted
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let first = HttpError::Status {
            status: 418,
            message: "teapot".to_string(),
        }
        .normalize(&resolved());

        let other_config =
            ClientConfig::default().resolve("https://elsewhere.test/", RequestConfig::default());
        let second = first.clone().normalize(&other_config);

        assert_eq!(first, second);
        assert_eq!(second.message, "HTTP error (418): teapot");
    }

    #[test]
    fn test_facade_error_display() {
        let error = Error::AdapterNotFound("nonexistent".to_string());
        assert_eq!(error.to_string(), "Adapter not found: nonexistent");
        assert!(error.as_normalized().is_none());
        assert!(!error.is_aborted());
    }
}
