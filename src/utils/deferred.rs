//! One-shot result cells.
//!
//! A [`DeferredResult`] is handed to the caller before its value exists and
//! is settled later, exactly once, by whoever drives the request. Any number
//! of clones may wait on it.

use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::error::LlmError;

type Slot<T> = Option<Result<T, LlmError>>;

/// Write-once, multi-reader settlement cell.
///
/// Reading before settlement suspends until settlement. A cell that is never
/// settled keeps its readers suspended; values derived from a stream only
/// exist once that stream has been driven far enough.
pub struct DeferredResult<T> {
    tx: Arc<watch::Sender<Slot<T>>>,
}

impl<T> Clone for DeferredResult<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> std::fmt::Debug for DeferredResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredResult")
            .field("settled", &self.tx.borrow().is_some())
            .finish()
    }
}

impl<T> Default for DeferredResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredResult<T> {
    /// Create an unsettled cell.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Settle with a value. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with an error. Returns `false` if already settled.
    pub fn reject(&self, error: LlmError) -> bool {
        self.settle(Err(error))
    }

    /// Whether the cell has been settled.
    pub fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    fn settle(&self, outcome: Result<T, LlmError>) -> bool {
        let mut outcome = Some(outcome);
        // send_if_modified updates the value even when nobody is subscribed.
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = outcome.take();
            true
        })
    }
}

impl<T: Clone> DeferredResult<T> {
    /// The settled outcome, if any, without waiting.
    pub fn try_get(&self) -> Option<Result<T, LlmError>> {
        self.tx.borrow().clone()
    }

    /// Wait for settlement and return a copy of the outcome.
    pub async fn get(&self) -> Result<T, LlmError> {
        let mut rx = self.tx.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => None,
        };
        match outcome {
            Some(outcome) => outcome,
            // The sender lives as long as this handle, so the channel cannot close.
            None => std::future::pending().await,
        }
    }
}

impl<T> IntoFuture for DeferredResult<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T, LlmError>;
    type IntoFuture = BoxFuture<'static, Result<T, LlmError>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.get().await })
    }
}
