//! Language model capability trait
//!
//! The boundary every provider adapter implements. Adapters translate their
//! vendor event format into [`ModelStreamPart`](crate::types::ModelStreamPart)s;
//! nothing past this trait knows about HTTP or vendor JSON.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::streaming::ModelStream;
use crate::types::{CallOptions, RequestMetadata, ResponseHeaders};

/// Result of starting a streamed call.
pub struct StreamResponse {
    /// Raw part stream.
    pub stream: ModelStream,
    /// What was sent, if the adapter reports it.
    pub request: Option<RequestMetadata>,
    /// Response headers, if the adapter reports them.
    pub response: Option<ResponseHeaders>,
}

impl StreamResponse {
    /// Response with no request or header information.
    pub fn new(stream: ModelStream) -> Self {
        Self {
            stream,
            request: None,
            response: None,
        }
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("request", &self.request)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name used in logs and errors.
    fn provider(&self) -> &str;

    /// Model id; seeds the default response metadata.
    fn model_id(&self) -> &str;

    /// Start a streamed generation.
    ///
    /// Implementations should honour `options.abort_signal` while connecting
    /// and while streaming.
    async fn do_stream(&self, options: CallOptions) -> Result<StreamResponse, LlmError>;
}
