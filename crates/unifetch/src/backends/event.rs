//! Event driven transport
//!
//! An [`EventRequest`] is opened, configured step by step, then sent with a
//! callback. The callback receives exactly one [`TransportEvent`] once the
//! request reaches a terminal state. [`EventTransport`] turns that callback
//! into the [`Transport`] call shape.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::collect_headers;
use crate::config::{Headers, Method, ResolvedRequest, ResponseType};
use crate::error::{HttpError, Normalize, NormalizedError};
use crate::response::{decode, DecodedBody, JsonFallback, RawResponse};
use crate::transport::Transport;

/// Terminal event of an [`EventRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The response was fully received, whatever its status
    Load(RawResponse),
    /// Network level failure
    Error {
        /// Status, if the response head had already arrived
        status: Option<u16>,
        /// Failure description
        message: String,
    },
    /// The request level timeout elapsed
    Timeout,
}

/// Callback driven request
#[derive(Debug)]
pub struct EventRequest {
    client: reqwest::Client,
    method: Method,
    url: String,
    headers: Headers,
    timeout: Option<Duration>,
    response_type: ResponseType,
}

impl EventRequest {
    /// Open a request
    pub fn open(client: &reqwest::Client, method: Method, url: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            method,
            url: url.into(),
            headers: Headers::new(),
            timeout: None,
            response_type: ResponseType::Text,
        }
    }

    /// Limit the whole request, connect to last body byte
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Attach a request header
    pub fn set_request_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// Set how the response should be decoded
    pub fn set_response_type(&mut self, response_type: ResponseType) {
        self.response_type = response_type;
    }

    /// Decoding mode set on this request
    pub fn response_type(&self) -> &ResponseType {
        &self.response_type
    }

    /// Send the request, `on_event` is called once with the terminal event
    ///
    /// Aborting the returned handle drops the request without an event.
    pub fn send<F>(self, body: Option<Vec<u8>>, on_event: F) -> JoinHandle<()>
    where
        F: FnOnce(TransportEvent) + Send + 'static,
    {
        tokio::spawn(async move {
            let event = self.perform(body).await;
            on_event(event);
        })
    }

    async fn perform(self, body: Option<Vec<u8>>) -> TransportEvent {
        let url = match url::Url::parse(&self.url) {
            Ok(url) => url,
            Err(err) => {
                return TransportEvent::Error {
                    status: None,
                    message: HttpError::from(err).to_string(),
                }
            }
        };

        let mut builder = self.client.request(self.method.into(), url);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return failure(None, err),
        };

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        match response.bytes().await {
            Ok(body) => TransportEvent::Load(RawResponse::new(status, headers, body.to_vec())),
            Err(err) => failure(Some(status), err),
        }
    }
}

fn failure(status: Option<u16>, err: reqwest::Error) -> TransportEvent {
    if err.is_timeout() {
        return TransportEvent::Timeout;
    }

    TransportEvent::Error {
        status: status.or_else(|| err.status().map(|status| status.as_u16())),
        message: err.to_string(),
    }
}

/// Event driven transport
///
/// Unlike [`super::FetchTransport`], a `json` body that fails to parse is
/// returned as [`DecodedBody::Text`] instead of failing the request.
#[derive(Debug, Clone, Default)]
pub struct EventTransport {
    inner: reqwest::Client,
}

impl EventTransport {
    /// Create a transport with a default reqwest client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport from a configured reqwest::Client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    async fn dispatch(
        &self,
        request: &ResolvedRequest,
        cancel: &CancellationToken,
    ) -> Result<DecodedBody, HttpError> {
        let mut xhr = EventRequest::open(&self.inner, request.method, request.url.clone());
        xhr.set_timeout(request.timeout);
        for (key, value) in &request.headers {
            xhr.set_request_header(key.as_str(), value.as_str());
        }
        xhr.set_response_type(request.response_type.clone());
        let response_type = xhr.response_type().clone();

        let body = request.body.as_ref().map(|b| b.to_bytes()).transpose()?;

        let (tx, rx) = oneshot::channel();
        let task = xhr.send(body, move |event| {
            let _ = tx.send(event);
        });

        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                task.abort();
                return Err(HttpError::Aborted);
            }
            event = rx => event.map_err(|_| {
                HttpError::Other("Request ended without a terminal event".to_string())
            })?,
        };

        match event {
            TransportEvent::Load(raw) if raw.is_success() => {
                decode(raw, &response_type, JsonFallback::Text)
            }
            TransportEvent::Load(raw) => Err(raw.status_error()),
            TransportEvent::Error {
                status: Some(status),
                message,
            } => Err(HttpError::Status { status, message }),
            TransportEvent::Error {
                status: None,
                message,
            } => Err(HttpError::Connection(message)),
            TransportEvent::Timeout => Err(HttpError::Timeout),
        }
    }
}

#[async_trait]
impl Transport for EventTransport {
    async fn execute(
        &self,
        request: ResolvedRequest,
        cancel: CancellationToken,
    ) -> Result<DecodedBody, NormalizedError> {
        self.dispatch(&request, &cancel)
            .await
            .map_err(|err| err.normalize(&request))
    }
}
