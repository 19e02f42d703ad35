//! HTTP response types and body decoding

use serde::de::DeserializeOwned;

use crate::config::{Headers, ResponseType};
use crate::error::{Error, HttpError};

/// Result type returned by the request facade
pub type Response<R, E = Error> = Result<R, E>;

/// Raw HTTP response with status code, headers and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
}

impl RawResponse {
    /// Create a new RawResponse
    pub fn new(status: u16, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers as received
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Look up a header, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Response body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the response, returning the body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as text, invalid UTF-8 is replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Get the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(HttpError::from)
    }

    /// Error for a non-success status, with the body as message
    pub(crate) fn status_error(&self) -> HttpError {
        HttpError::Status {
            status: self.status,
            message: self.text(),
        }
    }
}

/// Opaque binary object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl Blob {
    /// Create a blob
    pub fn new(content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type,
            bytes,
        }
    }

    /// MIME type reported by the server
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Blob contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Response body decoded according to a [`ResponseType`]
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    /// `text` mode
    Text(String),
    /// `json` mode
    Json(serde_json::Value),
    /// `blob` mode
    Blob(Blob),
    /// `arraybuffer` mode
    ArrayBuffer(Vec<u8>),
    /// Unrecognized mode, the transport's response unmodified
    Raw(RawResponse),
}

impl DecodedBody {
    /// Text body, if decoded as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DecodedBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// JSON body, if decoded as JSON
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            DecodedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Binary contents, empty for an already parsed JSON value
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DecodedBody::Text(text) => text.as_bytes(),
            DecodedBody::Json(_) => &[],
            DecodedBody::Blob(blob) => blob.bytes(),
            DecodedBody::ArrayBuffer(bytes) => bytes,
            DecodedBody::Raw(raw) => raw.body(),
        }
    }

    /// Deserialize the body into `T`
    ///
    /// JSON values are converted directly; text and binary bodies are parsed
    /// as JSON first.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        match self {
            DecodedBody::Json(value) => serde_json::from_value(value).map_err(HttpError::from),
            other => serde_json::from_slice(other.as_bytes()).map_err(HttpError::from),
        }
    }
}

/// What a transport does when a `json` body fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JsonFallback {
    /// Report the parse failure
    Propagate,
    /// Return the body as [`DecodedBody::Text`]
    Text,
}

/// Decode a successful response according to `response_type`
pub(crate) fn decode(
    raw: RawResponse,
    response_type: &ResponseType,
    fallback: JsonFallback,
) -> Result<DecodedBody, HttpError> {
    match response_type {
        ResponseType::Text => Ok(DecodedBody::Text(raw.text())),
        ResponseType::Json => match raw.json::<serde_json::Value>() {
            Ok(value) => Ok(DecodedBody::Json(value)),
            Err(err) => match fallback {
                JsonFallback::Propagate => Err(err),
                JsonFallback::Text => {
                    tracing::debug!("Response is not valid JSON, returning text: {}", err);
                    Ok(DecodedBody::Text(raw.text()))
                }
            },
        },
        ResponseType::Blob => {
            let content_type = raw.header("content-type").map(str::to_string);
            Ok(DecodedBody::Blob(Blob::new(content_type, raw.into_body())))
        }
        ResponseType::ArrayBuffer => Ok(DecodedBody::ArrayBuffer(raw.into_body())),
        ResponseType::Other(_) => Ok(DecodedBody::Raw(raw)),
    }
}
