//! Stitchable stream
//!
//! An outer stream that can be handed to a consumer before the streams that
//! feed it exist. Inner streams are attached later through a
//! [`StitchableController`] and drained one after another, in attach order.
//!
//! The outer stream ends when:
//! - the controller closed it and every queued inner stream finished
//! - an inner stream yielded an error (the error is forwarded first)
//! - the controller terminated it
//! - the consumer dropped it
//!
//! After any of these, attaching fails with `LlmError::InvalidState`.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::error::LlmError;

/// Inner stream type accepted by [`StitchableController::add_stream`].
pub type InnerStream<T> = Pin<Box<dyn Stream<Item = Result<T, LlmError>> + Send>>;

/// Outer stream returned by [`create_stitchable_stream`].
pub type StitchedStream<T> = Pin<Box<dyn Stream<Item = Result<T, LlmError>> + Send>>;

enum Command<T> {
    Attach(InnerStream<T>),
    Close,
}

/// Write side of a stitchable stream.
pub struct StitchableController<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    closed: Arc<AtomicBool>,
    terminate: CancellationToken,
}

impl<T> Clone for StitchableController<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            closed: Arc::clone(&self.closed),
            terminate: self.terminate.clone(),
        }
    }
}

impl<T> std::fmt::Debug for StitchableController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StitchableController")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .field("terminated", &self.terminate.is_cancelled())
            .finish()
    }
}

impl<T> StitchableController<T> {
    /// Queue an inner stream behind the ones already attached.
    pub fn add_stream(&self, stream: InnerStream<T>) -> Result<(), LlmError> {
        if self.closed.load(Ordering::Acquire) || self.terminate.is_cancelled() {
            return Err(LlmError::InvalidState(
                "cannot add inner stream: outer stream is closed".to_string(),
            ));
        }
        self.tx.send(Command::Attach(stream)).map_err(|_| {
            LlmError::InvalidState("cannot add inner stream: outer stream was dropped".to_string())
        })
    }

    /// Stop accepting inner streams; the outer stream ends once the queue drains.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.tx.send(Command::Close);
        }
    }

    /// End the outer stream now, dropping queued inner streams.
    pub fn terminate(&self) {
        self.closed.store(true, Ordering::Release);
        self.terminate.cancel();
    }

    /// Whether the outer stream has ended or been told to end.
    pub fn is_terminated(&self) -> bool {
        self.terminate.is_cancelled()
    }

    /// Resolves once the outer stream has ended for any reason.
    pub fn terminated(&self) -> WaitForCancellationFutureOwned {
        self.terminate.clone().cancelled_owned()
    }
}

enum Step<T> {
    Item(T),
    Fail(LlmError),
    InnerDone,
    Attach(InnerStream<T>),
    Stop,
}

/// Create an outer stream and the controller that feeds it.
pub fn create_stitchable_stream<T>() -> (StitchedStream<T>, StitchableController<T>)
where
    T: Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Command<T>>();
    let closed = Arc::new(AtomicBool::new(false));
    let terminate = CancellationToken::new();

    let controller = StitchableController {
        tx,
        closed: Arc::clone(&closed),
        terminate: terminate.clone(),
    };

    // Fires when the outer stream is dropped, finished or not.
    let guard = terminate.clone().drop_guard();

    let stream = async_stream::stream! {
        let _guard = guard;
        let mut current: Option<InnerStream<T>> = None;

        loop {
            let step = match current.as_mut() {
                Some(inner) => tokio::select! {
                    biased;
                    _ = terminate.cancelled() => Step::Stop,
                    item = inner.next() => match item {
                        Some(Ok(value)) => Step::Item(value),
                        Some(Err(err)) => Step::Fail(err),
                        None => Step::InnerDone,
                    },
                },
                None => tokio::select! {
                    biased;
                    _ = terminate.cancelled() => Step::Stop,
                    cmd = rx.recv() => match cmd {
                        Some(Command::Attach(inner)) => Step::Attach(inner),
                        Some(Command::Close) | None => Step::Stop,
                    },
                },
            };

            match step {
                Step::Item(value) => yield Ok(value),
                Step::Fail(err) => {
                    tracing::debug!("inner stream failed, terminating outer stream: {}", err);
                    yield Err(err);
                    break;
                }
                Step::InnerDone => current = None,
                Step::Attach(inner) => current = Some(inner),
                Step::Stop => break,
            }
        }

        closed.store(true, Ordering::Release);
        terminate.cancel();
        rx.close();
        while rx.try_recv().is_ok() {}
    };

    (Box::pin(stream), controller)
}
