//! Client and per-request configuration
//!
//! [`ClientConfig`] is the immutable template a [`crate::HttpClient`] is built
//! with. Every call supplies a [`RequestConfig`] with partial overrides; the
//! two are merged into a [`ResolvedRequest`], which is what transports execute
//! and what a [`crate::NormalizedError`] reports as the configuration in effect.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::backends::FETCH_ADAPTER;
use crate::error::HttpError;

/// Header mapping, header name to value
pub type Headers = BTreeMap<String, String>;

/// Insert a header, replacing any existing entry whose name differs only in
/// ASCII case
pub(crate) fn insert_header(
    headers: &mut Headers,
    key: impl Into<String>,
    value: impl Into<String>,
) {
    let key = key.into();
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
    headers.insert(key, value.into());
}

/// Overlay `overrides` on `headers`, header names compared ignoring case
pub(crate) fn merge_headers(headers: &mut Headers, overrides: Headers) {
    for (key, value) in overrides {
        insert_header(headers, key, value);
    }
}

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default `Content-Type` header attached to every request
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper case method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(format!("Unsupported method: {}", s)),
        }
    }
}

/// How a successful response body is decoded
///
/// Any name other than the four known modes maps to [`ResponseType::Other`],
/// which hands back the transport's raw response untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseType {
    /// Body as UTF-8 text
    Text,
    /// Body parsed as JSON
    #[default]
    Json,
    /// Opaque binary object with its content type
    Blob,
    /// Raw byte buffer
    ArrayBuffer,
    /// Unrecognized mode, the raw response is returned
    Other(String),
}

impl ResponseType {
    /// Mode name
    pub fn as_str(&self) -> &str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::Blob => "blob",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Other(name) => name,
        }
    }
}

impl From<&str> for ResponseType {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "text" => ResponseType::Text,
            "json" => ResponseType::Json,
            "blob" => ResponseType::Blob,
            "arraybuffer" => ResponseType::ArrayBuffer,
            _ => ResponseType::Other(value.to_string()),
        }
    }
}

impl From<String> for ResponseType {
    fn from(value: String) -> Self {
        ResponseType::from(value.as_str())
    }
}

impl From<ResponseType> for String {
    fn from(value: ResponseType) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for ResponseType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResponseType::from(s))
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw string, sent as is
    Text(String),
    /// Structured value, serialized as JSON
    Json(serde_json::Value),
    /// Opaque binary form
    Binary(Vec<u8>),
}

impl RequestBody {
    /// Serialize any value into a [`RequestBody::Json`]
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, HttpError> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    /// Bytes sent on the wire
    pub fn to_bytes(&self) -> Result<Vec<u8>, HttpError> {
        match self {
            RequestBody::Text(text) => Ok(text.as_bytes().to_vec()),
            RequestBody::Json(value) => Ok(serde_json::to_vec(value)?),
            RequestBody::Binary(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        RequestBody::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        RequestBody::Text(value.to_string())
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        RequestBody::Binary(value)
    }
}

/// Partial client configuration accepted at construction
///
/// Every field is optional; [`ClientConfig::from`] fills the gaps with the
/// defaults. This is also the shape loaded from configuration files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Prefix for relative request paths
    pub base_url: Option<String>,
    /// Timeout in milliseconds
    pub timeout: Option<u64>,
    /// Registered transport name
    pub adapter: Option<String>,
    /// Response decoding mode
    pub response_type: Option<ResponseType>,
    /// Headers added on top of the default `Content-Type`
    pub headers: Option<Headers>,
}

impl ClientOptions {
    /// Set the base url
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the timeout in milliseconds
    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Select the transport by name
    pub fn adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = Some(adapter.into());
        self
    }

    /// Set the response decoding mode
    pub fn response_type(mut self, response_type: impl Into<ResponseType>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(self.headers.get_or_insert_with(Headers::new), key, value);
        self
    }

    /// Overlay `other` on top of `self`, fields set in `other` win
    pub fn merge(mut self, other: ClientOptions) -> Self {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.adapter.is_some() {
            self.adapter = other.adapter;
        }
        if other.response_type.is_some() {
            self.response_type = other.response_type;
        }
        if let Some(headers) = other.headers {
            merge_headers(self.headers.get_or_insert_with(Headers::new), headers);
        }
        self
    }
}

/// Immutable client configuration template
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Prefix for relative request paths, empty for none
    pub base_url: String,
    /// Default request timeout
    pub timeout: Duration,
    /// Default transport name
    pub adapter: String,
    /// Default response decoding mode
    pub response_type: ResponseType,
    /// Default headers
    pub headers: Headers,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string());

        Self {
            base_url: String::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            adapter: FETCH_ADAPTER.to_string(),
            response_type: ResponseType::default(),
            headers,
        }
    }
}

impl From<ClientOptions> for ClientConfig {
    fn from(options: ClientOptions) -> Self {
        let mut config = ClientConfig::default();

        if let Some(base_url) = options.base_url {
            config.base_url = base_url;
        }
        match options.timeout {
            Some(0) => tracing::warn!(
                "Ignoring zero timeout, using default of {}ms",
                DEFAULT_TIMEOUT_MS
            ),
            Some(timeout) => config.timeout = Duration::from_millis(timeout),
            None => {}
        }
        if let Some(adapter) = options.adapter {
            config.adapter = adapter;
        }
        if let Some(response_type) = options.response_type {
            config.response_type = response_type;
        }
        if let Some(headers) = options.headers {
            merge_headers(&mut config.headers, headers);
        }

        config
    }
}

impl ClientConfig {
    /// Merge per-call overrides into this template and resolve the target url
    pub fn resolve(&self, path: &str, overrides: RequestConfig) -> ResolvedRequest {
        let mut headers = self.headers.clone();
        merge_headers(&mut headers, overrides.headers);

        let base_url = overrides.base_url.as_deref().unwrap_or(&self.base_url);

        ResolvedRequest {
            method: overrides.method.unwrap_or_default(),
            url: resolve_url(base_url, path),
            headers,
            body: overrides.body,
            timeout: overrides
                .timeout
                .filter(|timeout| !timeout.is_zero())
                .unwrap_or(self.timeout),
            response_type: overrides
                .response_type
                .unwrap_or_else(|| self.response_type.clone()),
            adapter: overrides.adapter.unwrap_or_else(|| self.adapter.clone()),
        }
    }
}

/// Per-call overrides
///
/// Fields left unset fall back to the client's [`ClientConfig`]. Headers are
/// merged key by key with the client defaults, ignoring the case of header
/// names; keys set here win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    /// HTTP method, GET when unset
    pub method: Option<Method>,
    /// Base url override
    pub base_url: Option<String>,
    /// Timeout override
    pub timeout: Option<Duration>,
    /// Transport override
    pub adapter: Option<String>,
    /// Decoding mode override
    pub response_type: Option<ResponseType>,
    /// Headers merged over the client defaults
    pub headers: Headers,
    /// Request payload
    pub body: Option<RequestBody>,
}

impl RequestConfig {
    /// Empty override set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Override the base url
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the timeout in milliseconds
    pub fn timeout_ms(self, timeout: u64) -> Self {
        self.timeout(Duration::from_millis(timeout))
    }

    /// Route the call to another transport
    pub fn adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = Some(adapter.into());
        self
    }

    /// Override the decoding mode
    pub fn response_type(mut self, response_type: impl Into<ResponseType>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, key, value);
        self
    }

    /// Attach a payload
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Fully merged configuration of a single request
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    /// HTTP method
    pub method: Method,
    /// Target url after base url resolution
    pub url: String,
    /// Merged headers
    pub headers: Headers,
    /// Payload
    pub body: Option<RequestBody>,
    /// Timeout for this request
    pub timeout: Duration,
    /// Decoding mode for a successful response
    pub response_type: ResponseType,
    /// Transport the request is routed to
    pub adapter: String,
}

impl ResolvedRequest {
    /// Parse the resolved url
    pub fn parsed_url(&self) -> Result<Url, HttpError> {
        Ok(Url::parse(&self.url)?)
    }

    /// Look up a header, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Resolve `path` against `base_url`
///
/// An absolute `path` (one carrying a scheme) is returned as is, as is any
/// path when `base_url` is empty. A protocol relative `//host/..` path takes
/// the base url's scheme, and a `?query` or `#fragment` replaces the base
/// url's own. Otherwise the path is appended to the base url with exactly
/// one `/` between them, keeping the base url's own path.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if base_url.is_empty() || Url::parse(path).is_ok() {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }
    if path.starts_with("//") {
        if let Ok(base) = Url::parse(base_url) {
            return format!("{}:{}", base.scheme(), path);
        }
    }
    if path.starts_with('?') || path.starts_with('#') {
        let end = if path.starts_with('?') {
            base_url.find(['?', '#'])
        } else {
            base_url.find('#')
        };
        let base = end.map_or(base_url, |index| &base_url[..index]);
        return format!("{}{}", base.trim_end_matches('/'), path);
    }

    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.base_url, "");
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.adapter, "fetch");
        assert_eq!(config.response_type, ResponseType::Json);
        assert_eq!(
            config.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_options_fill_gaps_with_defaults() {
        let config = ClientConfig::from(
            ClientOptions::default()
                .base_url("https://api.example.com")
                .header("A", "1"),
        );

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.headers.get("A").map(String::as_str), Some("1"));
        assert!(config.headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let config = ClientConfig::from(ClientOptions::default().timeout_ms(0));
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_resolve_url_joins_base_path() {
        assert_eq!(
            resolve_url("https://api.example.com/v1", "/users"),
            "https://api.example.com/v1/users"
        );
        assert_eq!(
            resolve_url("https://api.example.com/v1/", "users"),
            "https://api.example.com/v1/users"
        );
    }

    #[test]
    fn test_resolve_url_absolute_path_ignores_base() {
        assert_eq!(
            resolve_url("https://api.example.com/v1", "https://other.test/x"),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_resolve_url_protocol_relative_takes_base_scheme() {
        assert_eq!(
            resolve_url("https://api.example.com/v1", "//cdn.test/x"),
            "https://cdn.test/x"
        );
    }

    #[test]
    fn test_resolve_url_query_and_fragment() {
        assert_eq!(
            resolve_url("https://api.example.com/v1", "?page=2"),
            "https://api.example.com/v1?page=2"
        );
        assert_eq!(
            resolve_url("https://api.example.com/v1/?page=1#top", "?page=2"),
            "https://api.example.com/v1?page=2"
        );
        assert_eq!(
            resolve_url("https://api.example.com/v1?page=1#top", "#bottom"),
            "https://api.example.com/v1?page=1#bottom"
        );
    }

    #[test]
    fn test_resolve_url_without_base_is_verbatim() {
        assert_eq!(resolve_url("", "/users"), "/users");
        assert_eq!(resolve_url("", "relative/path"), "relative/path");
    }

    #[test]
    fn test_headers_merge_and_override() {
        let config = ClientConfig::from(ClientOptions::default().header("A", "1"));

        let both = config.resolve("/x", RequestConfig::new().header("B", "2"));
        assert_eq!(both.headers.get("A").map(String::as_str), Some("1"));
        assert_eq!(both.headers.get("B").map(String::as_str), Some("2"));

        let overridden = config.resolve("/x", RequestConfig::new().header("A", "9"));
        assert_eq!(overridden.headers.get("A").map(String::as_str), Some("9"));
    }

    #[test]
    fn test_header_override_ignores_case() {
        let config = ClientConfig::from(ClientOptions::default().header("x-api-key", "file"));
        assert_eq!(config.headers.len(), 2);

        let resolved = config.resolve(
            "/x",
            RequestConfig::new()
                .header("content-type", "text/plain")
                .header("X-API-KEY", "call"),
        );

        assert_eq!(resolved.headers.len(), 2);
        assert_eq!(resolved.header("Content-Type"), Some("text/plain"));
        assert_eq!(resolved.headers.get("content-type").map(String::as_str), Some("text/plain"));
        assert_eq!(resolved.headers.get("X-API-KEY").map(String::as_str), Some("call"));
        assert!(!resolved.headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_options_header_case_merge() {
        let merged = ClientOptions::default()
            .header("Accept", "text/html")
            .header("accept", "text/plain")
            .merge(ClientOptions::default().header("ACCEPT", "application/json"));

        let headers = merged.headers.expect("Headers merged");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("ACCEPT").map(String::as_str), Some("application/json"));

        let config = ClientConfig::from(ClientOptions::default().header("CONTENT-TYPE", "text/csv"));
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers.get("CONTENT-TYPE").map(String::as_str), Some("text/csv"));
    }

    #[test]
    fn test_overrides_win() {
        let config = ClientConfig::default();
        let resolved = config.resolve(
            "https://api.example.com/items",
            RequestConfig::new()
                .method(Method::Put)
                .timeout_ms(250)
                .adapter("event")
                .response_type("text")
                .body("payload"),
        );

        assert_eq!(resolved.method, Method::Put);
        assert_eq!(resolved.timeout, Duration::from_millis(250));
        assert_eq!(resolved.adapter, "event");
        assert_eq!(resolved.response_type, ResponseType::Text);
        assert_eq!(resolved.body, Some(RequestBody::Text("payload".to_string())));
    }

    #[test]
    fn test_response_type_names() {
        assert_eq!(ResponseType::from("arraybuffer"), ResponseType::ArrayBuffer);
        assert_eq!(ResponseType::from("BLOB"), ResponseType::Blob);
        assert_eq!(
            ResponseType::from("document"),
            ResponseType::Other("document".to_string())
        );
        assert_eq!(ResponseType::Other("stream".to_string()).to_string(), "stream");
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("delete".parse::<Method>(), Ok(Method::Delete));
        assert!("PATCH".parse::<Method>().is_err());
    }

    #[test]
    fn test_options_deserialize() {
        let options: ClientOptions = serde_json::from_str(
            r#"{"base_url": "https://api.example.com", "timeout": 500, "response_type": "text", "headers": {"X-Key": "k"}}"#,
        )
        .expect("Valid options");

        assert_eq!(options.timeout, Some(500));
        assert_eq!(options.response_type, Some(ResponseType::Text));
        assert_eq!(
            options.headers.and_then(|h| h.get("X-Key").cloned()),
            Some("k".to_string())
        );
    }

    #[test]
    fn test_options_merge_prefers_later() {
        let merged = ClientOptions::default()
            .timeout_ms(100)
            .header("A", "1")
            .merge(ClientOptions::default().timeout_ms(200).header("B", "2"));

        assert_eq!(merged.timeout, Some(200));
        let headers = merged.headers.expect("Headers merged");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_json_body_bytes() {
        let body = RequestBody::json(&serde_json::json!({"a": 1})).expect("Serializable");
        assert_eq!(body.to_bytes().expect("Encodable"), br#"{"a":1}"#.to_vec());
    }
}
