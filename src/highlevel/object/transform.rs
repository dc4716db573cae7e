//! Model part stream to object part stream.
//!
//! [`ObjectStreamTransformer`] holds the per-request buffer state and is
//! driven one provider part at a time; [`transform_stream`] wraps it around a
//! provider stream and settles the deferred handles.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::Value;

use super::options::{FinishCallback, ObjectFinishEvent};
use super::result::{RejectOnDrop, ResultHandles};
use crate::error::LlmError;
use crate::output::{
    FinalContext, OutputStrategy, PartialInput, RepairFn,
    parse_and_validate_object_result_with_repair,
};
use crate::streaming::parse_partial_json;
use crate::types::{
    FinishReason, ModelStreamPart, ObjectStreamPart, ProviderMetadata, ResponseHeaders,
    ResponseMetadata, Usage, Warning,
};

/// Log provider warnings once per request.
pub fn log_warnings(warnings: &[Warning]) {
    for warning in warnings {
        tracing::warn!(warning = %warning, "provider reported a warning");
    }
}

/// Incremental state of one structured-output request.
pub(crate) struct ObjectStreamTransformer {
    strategy: Arc<dyn OutputStrategy>,
    repair: Option<RepairFn>,
    tool_mode: bool,
    handles: ResultHandles,
    response_headers: Option<ResponseHeaders>,

    accumulated_text: String,
    text_delta: String,
    latest_object_json: Option<Value>,
    latest_object: Option<Value>,
    is_first_delta: bool,
    final_delta_published: bool,

    warnings: Vec<Warning>,
    response: ResponseMetadata,
    usage: Usage,
    finish_reason: Option<FinishReason>,
    provider_metadata: Option<ProviderMetadata>,
    outcome: Option<Result<Value, LlmError>>,
}

impl ObjectStreamTransformer {
    pub fn new(
        strategy: Arc<dyn OutputStrategy>,
        response: ResponseMetadata,
        handles: ResultHandles,
    ) -> Self {
        Self {
            strategy,
            repair: None,
            tool_mode: false,
            handles,
            response_headers: None,
            accumulated_text: String::new(),
            text_delta: String::new(),
            latest_object_json: None,
            latest_object: None,
            is_first_delta: true,
            final_delta_published: false,
            warnings: Vec::new(),
            response,
            usage: Usage::default(),
            finish_reason: None,
            provider_metadata: None,
            outcome: None,
        }
    }

    pub fn with_repair(mut self, repair: Option<RepairFn>) -> Self {
        self.repair = repair;
        self
    }

    /// Read tool-input deltas instead of text deltas.
    pub fn with_tool_mode(mut self, tool_mode: bool) -> Self {
        self.tool_mode = tool_mode;
        self
    }

    pub fn with_response_headers(mut self, headers: Option<ResponseHeaders>) -> Self {
        self.response_headers = headers;
        self
    }

    /// Whether a finish part has been processed.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Raw text received so far.
    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.accumulated_text
    }

    /// Process one provider part.
    ///
    /// An `Err` is terminal: the caller forwards it and stops.
    pub fn process(&mut self, part: ModelStreamPart) -> Result<Vec<ObjectStreamPart>, LlmError> {
        let mut out = Vec::new();
        match part {
            ModelStreamPart::StreamStart { warnings } => {
                self.warnings = warnings.clone();
                out.push(ObjectStreamPart::StreamStart { warnings });
            }
            ModelStreamPart::TextDelta { delta } if !self.tool_mode => {
                self.push_text(&delta, &mut out);
            }
            ModelStreamPart::ToolInputDelta { delta, .. } if self.tool_mode => {
                self.push_text(&delta, &mut out);
            }
            ModelStreamPart::TextDelta { .. } | ModelStreamPart::ToolInputDelta { .. } => {
                tracing::trace!("ignoring delta that does not carry the structured output");
            }
            ModelStreamPart::ResponseMetadata {
                id,
                timestamp,
                model_id,
            } => {
                self.response.merge(id, timestamp, model_id);
                out.push(ObjectStreamPart::ResponseMetadata {
                    response: self.response.clone(),
                });
            }
            ModelStreamPart::Finish {
                finish_reason,
                usage,
                provider_metadata,
            } => self.finish(finish_reason, usage, provider_metadata, &mut out),
            ModelStreamPart::Error { error } => return Err(error),
        }
        Ok(out)
    }

    fn push_text(&mut self, delta: &str, out: &mut Vec<ObjectStreamPart>) {
        self.accumulated_text.push_str(delta);
        self.text_delta.push_str(delta);

        let parsed = parse_partial_json(&self.accumulated_text);
        let Some(value) = parsed.value.as_ref() else {
            return;
        };
        if self.latest_object_json.as_ref() == Some(value) {
            return;
        }

        let is_final_delta = parsed.is_complete();
        let validated = self.strategy.validate_partial(PartialInput {
            value,
            text_delta: &self.text_delta,
            latest_object: self.latest_object.as_ref(),
            is_first_delta: self.is_first_delta,
            is_final_delta,
        });

        match validated {
            Ok(accepted) if self.latest_object.as_ref() != Some(&accepted.partial) => {
                self.latest_object_json = parsed.value;
                self.latest_object = Some(accepted.partial.clone());
                out.push(ObjectStreamPart::Object {
                    object: accepted.partial,
                });
                if !accepted.text_delta.is_empty() {
                    out.push(ObjectStreamPart::TextDelta {
                        text_delta: accepted.text_delta,
                    });
                }
                self.text_delta.clear();
                self.is_first_delta = false;
                self.final_delta_published = is_final_delta;
            }
            Ok(_) => {}
            Err(e) => tracing::trace!("partial withheld: {}", e),
        }
    }

    fn full_response(&self) -> ResponseMetadata {
        ResponseMetadata {
            headers: self.response_headers.clone(),
            ..self.response.clone()
        }
    }

    fn finish(
        &mut self,
        finish_reason: FinishReason,
        usage: Usage,
        provider_metadata: Option<ProviderMetadata>,
        out: &mut Vec<ObjectStreamPart>,
    ) {
        let text_delta = self.strategy.finish_text_delta(
            std::mem::take(&mut self.text_delta),
            self.final_delta_published,
            self.is_first_delta,
        );
        if !text_delta.is_empty() {
            out.push(ObjectStreamPart::TextDelta { text_delta });
        }

        self.finish_reason = Some(finish_reason.clone());
        self.usage = usage.clone();
        self.provider_metadata = provider_metadata.clone();
        let response = self.full_response();

        out.push(ObjectStreamPart::Finish {
            finish_reason: finish_reason.clone(),
            usage: usage.clone(),
            response: response.clone(),
            provider_metadata: provider_metadata.clone(),
        });

        log_warnings(&self.warnings);

        self.handles.usage.resolve(usage.clone());
        self.handles.provider_metadata.resolve(provider_metadata);
        self.handles.warnings.resolve(self.warnings.clone());
        self.handles.response.resolve(response.clone());
        self.handles.finish_reason.resolve(finish_reason.clone());

        let ctx = FinalContext {
            text: self.accumulated_text.clone(),
            response,
            usage,
            finish_reason,
        };
        let outcome = parse_and_validate_object_result_with_repair(
            &self.accumulated_text,
            self.strategy.as_ref(),
            self.repair.as_ref(),
            &ctx,
        );
        match &outcome {
            Ok(value) => {
                tracing::debug!("structured output validated");
                self.handles.object.resolve(value.clone());
            }
            Err(e) => {
                tracing::debug!("structured output failed final validation: {}", e);
                self.handles.object.reject(e.clone());
            }
        }
        self.outcome = Some(outcome);
    }

    /// Event for the finish callback, once a finish part was processed.
    pub fn finish_event(&self) -> Option<ObjectFinishEvent> {
        let outcome = self.outcome.as_ref()?;
        Some(ObjectFinishEvent {
            usage: self.usage.clone(),
            object: outcome.as_ref().ok().cloned(),
            error: outcome.as_ref().err().cloned(),
            response: self.full_response(),
            warnings: self.warnings.clone(),
            provider_metadata: self.provider_metadata.clone(),
        })
    }
}

/// Drive `transformer` over `parts`.
///
/// Stream failures reject every unsettled handle and end the stream with the
/// error. Dropping the returned stream before it finished rejects the
/// unsettled handles as cancelled.
pub(crate) fn transform_stream<S>(
    parts: S,
    mut transformer: ObjectStreamTransformer,
    on_finish: Option<FinishCallback>,
) -> impl Stream<Item = Result<ObjectStreamPart, LlmError>> + Send
where
    S: Stream<Item = Result<ModelStreamPart, LlmError>> + Send + 'static,
{
    let handles = transformer.handles.clone();
    let guard = RejectOnDrop::new(handles.clone(), "object stream dropped before completion");

    async_stream::stream! {
        let _guard = guard;
        let mut parts = Box::pin(parts);
        let mut failure: Option<LlmError> = None;

        while let Some(item) = parts.next().await {
            match item.and_then(|part| transformer.process(part)) {
                Ok(out) => {
                    for part in out {
                        yield Ok(part);
                    }
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if failure.is_none() && !transformer.is_finished() {
            failure = Some(LlmError::StreamError(
                "model stream ended before a finish part".to_string(),
            ));
        }

        match failure {
            Some(err) => {
                tracing::debug!("structured output stream failed: {}", err);
                handles.reject_all(&err);
                yield Err(err);
            }
            None => {
                if let (Some(callback), Some(event)) = (on_finish, transformer.finish_event()) {
                    if let Err(err) = callback(event) {
                        yield Err(err);
                    }
                }
            }
        }
    }
}
