//! Cancellation utilities
//!
//! Provides first-class cancellation handles for requests and streams.

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;

/// A handle that can be used to request cancellation.
///
/// Clones share the same signal. Pass one into a request as its abort
/// signal and keep another to trigger it.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Anything observing this handle stops as soon as
    /// possible; streams surface a terminal `Cancelled` error.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A handle that is cancelled together with this one but can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

/// Wait until an optional handle fires. Without a handle, never resolves.
pub(crate) async fn cancelled_or_pending(handle: Option<&CancelHandle>) {
    match handle {
        Some(handle) => handle.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

/// Forward `inner` until it ends or `handle` fires.
///
/// Unlike silently ending, a fired handle yields one final
/// `Err(LlmError::Cancelled)` so readers observe a terminal error instead of
/// a truncated stream.
pub fn abortable_stream<S, T>(
    inner: S,
    handle: Option<CancelHandle>,
) -> impl Stream<Item = Result<T, LlmError>> + Send
where
    S: Stream<Item = Result<T, LlmError>> + Send + 'static,
    T: Send + 'static,
{
    async_stream::stream! {
        use futures::StreamExt;
        let mut inner = Box::pin(inner);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancelled_or_pending(handle.as_ref()) => None,
                item = inner.next() => Some(item),
            };
            match next {
                None => {
                    yield Err(LlmError::Cancelled("request aborted".into()));
                    break;
                }
                Some(Some(item)) => yield item,
                Some(None) => break,
            }
        }
    }
}
