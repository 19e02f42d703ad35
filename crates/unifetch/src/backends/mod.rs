//! Built-in transports
//!
//! Each transport is registered on every [`crate::HttpClient`] under the
//! name given by its constant.

mod client;
mod event;
mod fetch;

pub use client::{BitreqClient, ClientRequest, ClientResponse, ClientTransport, ExternalClient};
pub use event::{EventRequest, EventTransport, TransportEvent};
pub use fetch::FetchTransport;

use crate::config::{Headers, Method};

/// Name of the native-fetch style transport (the default)
pub const FETCH_ADAPTER: &str = "fetch";

/// Name of the event driven transport
pub const EVENT_ADAPTER: &str = "event";

/// Name of the external client transport
pub const CLIENT_ADAPTER: &str = "client";

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Collect reqwest response headers, dropping values that are not valid UTF-8
fn collect_headers(headers: &reqwest::header::HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}
