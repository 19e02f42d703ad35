//! Transport capability shared by every adapter
use std::fmt::Debug;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::ResolvedRequest;
use crate::error::NormalizedError;
use crate::response::DecodedBody;

/// A named strategy executing a resolved request against one network mechanism
///
/// Implementations receive the fully merged request and a cancellation token
/// scoped to that single request. They must stop work and fail with an
/// aborted [`NormalizedError`] once the token is cancelled.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Execute the request and decode its response
    async fn execute(
        &self,
        request: ResolvedRequest,
        cancel: CancellationToken,
    ) -> Result<DecodedBody, NormalizedError>;
}

/// Transport backed by an async closure
pub struct FnTransport<F> {
    f: F,
}

impl<F> Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

/// Wrap an async closure as a [`Transport`]
///
/// The closure only sees the resolved request; adapters that need to react to
/// cancellation should implement [`Transport`] directly.
pub fn adapter_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(ResolvedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DecodedBody, NormalizedError>> + Send + 'static,
{
    FnTransport { f }
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(ResolvedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DecodedBody, NormalizedError>> + Send + 'static,
{
    async fn execute(
        &self,
        request: ResolvedRequest,
        _cancel: CancellationToken,
    ) -> Result<DecodedBody, NormalizedError> {
        (self.f)(request).await
    }
}
