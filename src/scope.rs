//! Ties in-flight collaborator calls to the lifetime of the view that
//! issued them.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The view was torn down before the call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("view was torn down")]
pub struct Cancelled;

/// Cancellation scope owned by one view (a form session or a wizard).
///
/// Dropping the scope cancels everything still running through it.
#[derive(Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` unless the view is torn down first.
    ///
    /// A call that starts after teardown never polls `fut`.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        if self.token.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = self.token.cancelled() => {
                debug!("in-flight call dropped by teardown");
                Err(Cancelled)
            }
            out = fut => Ok(out),
        }
    }

    /// A handle the owner of the view can use to tear it down.
    pub fn teardown_handle(&self) -> TeardownHandle {
        TeardownHandle {
            token: self.token.clone(),
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Tears a view down from outside, e.g. from a Ctrl-C handler.
#[derive(Debug, Clone)]
pub struct TeardownHandle {
    token: CancellationToken,
}

impl TeardownHandle {
    pub fn teardown(&self) {
        self.token.cancel();
    }
}
