//! External client transport
//!
//! Delegates the whole request to a third-party client through the
//! [`ExternalClient`] trait. The client performs the request, enforces the
//! timeout, decodes the body and fails on non-success statuses; the transport
//! only unwraps `data` and normalizes failures. [`BitreqClient`] is the
//! built-in implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitreq::RequestExt;
use tokio_util::sync::CancellationToken;

use crate::config::{Headers, Method, RequestBody, ResolvedRequest, ResponseType};
use crate::error::{HttpError, Normalize, NormalizedError};
use crate::response::{decode, DecodedBody, JsonFallback, RawResponse};
use crate::transport::Transport;

/// Request handed to an [`ExternalClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute url
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Payload
    pub body: Option<RequestBody>,
    /// Time allowed for the whole request
    pub timeout: Duration,
    /// Decoding mode for `data`
    pub response_type: ResponseType,
}

impl From<&ResolvedRequest> for ClientRequest {
    fn from(request: &ResolvedRequest) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            timeout: request.timeout,
            response_type: request.response_type.clone(),
        }
    }
}

/// Successful response of an [`ExternalClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientResponse {
    /// HTTP status
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Decoded body
    pub data: DecodedBody,
}

/// Third-party HTTP client used by [`ClientTransport`]
#[async_trait]
pub trait ExternalClient: Send + Sync + std::fmt::Debug {
    /// Perform the request
    ///
    /// Must fail with [`HttpError::Status`] for non-success statuses and with
    /// [`HttpError::Timeout`] when `request.timeout` elapses.
    async fn send(&self, request: ClientRequest) -> Result<ClientResponse, HttpError>;
}

/// bitreq-based [`ExternalClient`]
///
/// A `json` body that fails to parse is returned as text.
#[derive(Clone)]
pub struct BitreqClient {
    client: Arc<bitreq::Client>,
}

impl std::fmt::Debug for BitreqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitreqClient").finish_non_exhaustive()
    }
}

impl Default for BitreqClient {
    fn default() -> Self {
        Self::new(bitreq::Client::new(10))
    }
}

impl BitreqClient {
    /// Wrap a bitreq client
    pub fn new(client: bitreq::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl ExternalClient for BitreqClient {
    async fn send(&self, request: ClientRequest) -> Result<ClientResponse, HttpError> {
        let url = url::Url::parse(&request.url)?;

        let mut req = match request.method {
            Method::Get => bitreq::get(url),
            Method::Post => bitreq::post(url),
            Method::Put => bitreq::put(url),
            Method::Delete => bitreq::delete(url),
        };
        for (key, value) in &request.headers {
            req = req.with_header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.with_body(body.to_bytes()?);
        }

        let response = tokio::time::timeout(
            request.timeout,
            req.send_async_with_client(&self.client),
        )
        .await
        .map_err(|_| HttpError::Timeout)?
        .map_err(HttpError::from)?;

        let status = response.status_code as u16;
        let headers: Headers = response
            .headers
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let raw = RawResponse::new(status, headers.clone(), response.into_bytes());

        if !raw.is_success() {
            return Err(raw.status_error());
        }

        let data = decode(raw, &request.response_type, JsonFallback::Text)?;

        Ok(ClientResponse {
            status,
            headers,
            data,
        })
    }
}

/// Transport delegating to an [`ExternalClient`]
#[derive(Debug, Clone)]
pub struct ClientTransport {
    client: Arc<dyn ExternalClient>,
}

impl Default for ClientTransport {
    fn default() -> Self {
        Self::new(Arc::new(BitreqClient::default()))
    }
}

impl ClientTransport {
    /// Create a transport around any external client
    pub fn new(client: Arc<dyn ExternalClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ClientTransport {
    async fn execute(
        &self,
        request: ResolvedRequest,
        cancel: CancellationToken,
    ) -> Result<DecodedBody, NormalizedError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HttpError::Aborted),
            response = self.client.send(ClientRequest::from(&request)) => response,
        };

        result
            .map(|response| response.data)
            .map_err(|err| err.normalize(&request))
    }
}
