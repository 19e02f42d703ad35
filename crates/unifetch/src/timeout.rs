//! Timer driven cancellation

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels a token once a timeout elapses
///
/// The timer task is aborted when the guard is dropped, so a request that
/// completes (either way) before the deadline leaves nothing behind. A timer
/// that fires after the token's request already finished only flags the
/// token, which nothing observes anymore.
#[derive(Debug)]
pub(crate) struct TimeoutGuard {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl TimeoutGuard {
    /// Arm a timer that cancels `token` after `timeout`
    pub(crate) fn arm(token: CancellationToken, timeout: Duration) -> Self {
        let timer = tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(timeout).await;
                tracing::debug!("Request timed out after {}ms", timeout.as_millis());
                token.cancel();
            }
        });

        Self { token, timer }
    }

    /// Token cancelled by this timer
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.timer.abort();
    }
}
