//! reqwest-based native-fetch style transport

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::collect_headers;
use crate::config::ResolvedRequest;
use crate::error::{HttpError, Normalize, NormalizedError};
use crate::response::{decode, DecodedBody, JsonFallback, RawResponse};
use crate::timeout::TimeoutGuard;
use crate::transport::Transport;

/// Fetch style transport
///
/// Every request gets its own timer which cancels the request's token when
/// the timeout elapses; the timer and the response race inside one task and
/// whichever finishes first wins. A `json` body that fails to parse is an
/// error.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    inner: reqwest::Client,
}

impl FetchTransport {
    /// Create a transport with a default reqwest client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport from a configured reqwest::Client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    async fn send(
        &self,
        request: &ResolvedRequest,
        token: &CancellationToken,
    ) -> Result<DecodedBody, HttpError> {
        let mut builder = self
            .inner
            .request(request.method.into(), request.parsed_url()?);

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_bytes()?);
        }

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(HttpError::Aborted),
            response = builder.send() => response?,
        };

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let body = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(HttpError::Aborted),
            body = response.bytes() => body?,
        };

        let raw = RawResponse::new(status, headers, body.to_vec());
        if !raw.is_success() {
            return Err(raw.status_error());
        }

        decode(raw, &request.response_type, JsonFallback::Propagate)
    }
}

#[async_trait]
impl Transport for FetchTransport {
    async fn execute(
        &self,
        request: ResolvedRequest,
        cancel: CancellationToken,
    ) -> Result<DecodedBody, NormalizedError> {
        let timer = TimeoutGuard::arm(cancel.child_token(), request.timeout);

        let result = self.send(&request, timer.token()).await;
        drop(timer);

        result.map_err(|err| {
            let err = match err {
                HttpError::Aborted if !cancel.is_cancelled() => HttpError::Timeout,
                other => other,
            };
            err.normalize(&request)
        })
    }
}
