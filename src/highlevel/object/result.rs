//! Result surface of `stream_object`.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LlmError;
use crate::output::{OutputStrategy, OutputType};
use crate::streaming::{ElementStream, ObjectStream, PartialObjectStream, TextStream};
use crate::types::{
    FinishReason, ObjectStreamPart, ProviderMetadata, RequestMetadata, ResponseMetadata, Usage,
    Warning,
};
use crate::utils::DeferredResult;

/// Every deferred value of one request.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResultHandles {
    pub object: DeferredResult<Value>,
    pub usage: DeferredResult<Usage>,
    pub warnings: DeferredResult<Vec<Warning>>,
    pub provider_metadata: DeferredResult<Option<ProviderMetadata>>,
    pub request: DeferredResult<RequestMetadata>,
    pub response: DeferredResult<ResponseMetadata>,
    pub finish_reason: DeferredResult<FinishReason>,
}

impl ResultHandles {
    /// Reject every handle that has not settled yet.
    pub fn reject_all(&self, error: &LlmError) {
        self.object.reject(error.clone());
        self.usage.reject(error.clone());
        self.warnings.reject(error.clone());
        self.provider_metadata.reject(error.clone());
        self.request.reject(error.clone());
        self.response.reject(error.clone());
        self.finish_reason.reject(error.clone());
    }
}

/// Rejects whatever is still unsettled when dropped.
pub(crate) struct RejectOnDrop {
    handles: ResultHandles,
    reason: &'static str,
}

impl RejectOnDrop {
    pub fn new(handles: ResultHandles, reason: &'static str) -> Self {
        Self { handles, reason }
    }
}

impl Drop for RejectOnDrop {
    fn drop(&mut self) {
        self.handles
            .reject_all(&LlmError::Cancelled(self.reason.to_string()));
    }
}

/// Handle to a streamed structured-output request.
///
/// Take the deferred handles you need first, then consume exactly one stream
/// view. Handles settle as the stream is driven; awaiting one without
/// driving the stream from somewhere waits forever.
///
/// ```rust,ignore
/// let result = stream_object(model, "Invent a character.", options)?;
/// let object = result.object();
/// let mut partials = result.partial_object_stream();
/// while let Some(partial) = partials.next().await {
///     println!("{partial}");
/// }
/// let character = object.await?;
/// ```
pub struct StreamObjectResult {
    pub(crate) stream: ObjectStream,
    pub(crate) strategy: Arc<dyn OutputStrategy>,
    pub(crate) handles: ResultHandles,
}

impl std::fmt::Debug for StreamObjectResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamObjectResult")
            .field("output", &self.strategy.output_type())
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}

impl StreamObjectResult {
    /// Output mode of this request.
    pub fn output_type(&self) -> OutputType {
        self.strategy.output_type()
    }

    /// Final validated value.
    ///
    /// Rejects with `LlmError::NoObjectGenerated` when the output could not be
    /// parsed or validated, or with the stream failure that ended the request.
    pub fn object(&self) -> DeferredResult<Value> {
        self.handles.object.clone()
    }

    /// Final value deserialized into `T`.
    pub fn object_as<T>(&self) -> impl Future<Output = Result<T, LlmError>> + Send + use<T>
    where
        T: DeserializeOwned,
    {
        let object = self.handles.object.clone();
        async move {
            let value = object.await?;
            serde_json::from_value::<T>(value)
                .map_err(|e| LlmError::JsonError(format!("Failed to deserialize object: {}", e)))
        }
    }

    pub fn usage(&self) -> DeferredResult<Usage> {
        self.handles.usage.clone()
    }

    pub fn warnings(&self) -> DeferredResult<Vec<Warning>> {
        self.handles.warnings.clone()
    }

    pub fn provider_metadata(&self) -> DeferredResult<Option<ProviderMetadata>> {
        self.handles.provider_metadata.clone()
    }

    /// Settles as soon as the provider call returned.
    pub fn request(&self) -> DeferredResult<RequestMetadata> {
        self.handles.request.clone()
    }

    pub fn response(&self) -> DeferredResult<ResponseMetadata> {
        self.handles.response.clone()
    }

    /// `FinishReason::Unknown` when the provider did not report one.
    pub fn finish_reason(&self) -> DeferredResult<FinishReason> {
        self.handles.finish_reason.clone()
    }

    /// Every part, errors included.
    pub fn full_stream(self) -> ObjectStream {
        self.stream
    }

    /// Distinct partial values. Error parts are skipped.
    pub fn partial_object_stream(self) -> PartialObjectStream {
        Box::pin(self.stream.filter_map(|part| async move {
            match part {
                ObjectStreamPart::Object { object } => Some(object),
                _ => None,
            }
        }))
    }

    /// Raw text deltas. Error parts are skipped.
    pub fn text_stream(self) -> TextStream {
        Box::pin(self.stream.filter_map(|part| async move {
            match part {
                ObjectStreamPart::TextDelta { text_delta } => Some(text_delta),
                _ => None,
            }
        }))
    }

    /// Completed array elements, one at a time.
    ///
    /// Fails with `LlmError::UnsupportedOperation` for non-array output.
    pub fn element_stream(self) -> Result<ElementStream, LlmError> {
        self.strategy.create_element_stream(self.stream)
    }
}
