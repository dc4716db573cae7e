//! Streamed structured output
//!
//! [`stream_object`] returns immediately with a [`StreamObjectResult`]. The
//! provider call runs on a spawned task; its part stream is turned into
//! partial values, text deltas and a final validated value as the caller
//! consumes the result stream.
//!
//! Request lifecycle:
//! - `created`: strategy, splicer and deferred handles exist, nothing sent yet
//! - `awaiting provider`: the adapter's `do_stream` is in flight
//! - `streaming`: the transformed provider stream is attached to the splicer
//! - `finished` or `failed`: every handle is settled
//!
//! A failure before streaming starts (invalid prompt, adapter error, abort)
//! is attached as a single `error` part and rejects every handle.

mod options;
mod result;
mod transform;


pub use options::{
    ErrorCallback, FinishCallback, ObjectFinishEvent, RESPONSE_ID_PREFIX, RESPONSE_ID_SIZE,
    StreamObjectOptions,
};
pub use result::StreamObjectResult;
pub use transform::log_warnings;

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;

use crate::error::LlmError;
use crate::output::{GenerateMode, OutputStrategy, output_strategy};
use crate::streaming::{ObjectStream, StitchableController, create_stitchable_stream};
use crate::traits::{LanguageModel, StreamResponse};
use crate::types::{
    CallOptions, FunctionTool, ObjectStreamPart, Prompt, ResponseFormat, ResponseMetadata,
    ToolChoice,
};
use crate::utils::cancel::{abortable_stream, cancelled_or_pending};

use result::ResultHandles;
use transform::{ObjectStreamTransformer, transform_stream};

/// Tool name used in tool mode when no schema name is given.
pub const DEFAULT_TOOL_NAME: &str = "json";
/// Tool description used in tool mode when no schema description is given.
pub const DEFAULT_TOOL_DESCRIPTION: &str = "Respond with a JSON object.";

/// Stream a structured value from `model`.
///
/// Fails synchronously only for invalid options (unsupported option
/// combinations, empty enum values, schemas that do not compile) or when
/// called outside a Tokio runtime. Everything else, including an invalid
/// prompt, surfaces through the returned stream and handles.
///
/// ```rust,ignore
/// let options = StreamObjectOptions::object(json!({
///     "type": "object",
///     "properties": { "content": { "type": "string" } },
///     "required": ["content"]
/// }));
/// let result = stream_object(model, "Say hello.", options)?;
/// let object = result.object();
/// result.full_stream().for_each(|part| async move { println!("{}", part.kind()) }).await;
/// println!("{}", object.await?);
/// ```
pub fn stream_object(
    model: Arc<dyn LanguageModel>,
    prompt: impl Into<Prompt>,
    options: StreamObjectOptions,
) -> Result<StreamObjectResult, LlmError> {
    options.validate()?;
    let strategy = output_strategy(&options.output)?;
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
        LlmError::InvalidState("stream_object must be called within a Tokio runtime".to_string())
    })?;

    let prompt = prompt.into();
    let call = build_call_options(strategy.as_ref(), &options);
    let response = ResponseMetadata::new(
        (options.id_generator)(),
        (options.clock)(),
        model.model_id(),
    );
    let handles = ResultHandles::default();
    let (outer, controller) = create_stitchable_stream::<ObjectStreamPart>();

    tracing::debug!(
        provider = model.provider(),
        model = model.model_id(),
        output = %strategy.output_type(),
        mode = ?options.mode,
        "starting structured output stream"
    );

    let transformer = ObjectStreamTransformer::new(Arc::clone(&strategy), response, handles.clone())
        .with_repair(options.repair_text.clone())
        .with_tool_mode(options.mode == GenerateMode::Tool);

    runtime.spawn(drive(
        model,
        prompt,
        call,
        transformer,
        options.on_finish.clone(),
        handles.clone(),
        controller,
    ));

    let on_error = options.on_error.clone();
    let stream: ObjectStream = Box::pin(outer.map(move |item| {
        let part = match item {
            Ok(part) => part,
            Err(error) => ObjectStreamPart::Error { error },
        };
        if let ObjectStreamPart::Error { error } = &part {
            match &on_error {
                Some(callback) => callback(error),
                None => tracing::error!(error = %error, "structured output stream error"),
            }
        }
        part
    }));

    Ok(StreamObjectResult {
        stream,
        strategy,
        handles,
    })
}

fn build_call_options(strategy: &dyn OutputStrategy, options: &StreamObjectOptions) -> CallOptions {
    let mut call = CallOptions {
        settings: options.settings.clone(),
        headers: options.headers.clone(),
        provider_options: options.provider_options.clone(),
        abort_signal: options.abort_signal.clone(),
        ..CallOptions::default()
    };

    match options.mode {
        GenerateMode::Auto | GenerateMode::Json => {
            call.response_format = Some(ResponseFormat::Json {
                schema: strategy.json_schema(),
                name: options.schema_name.clone(),
                description: options.schema_description.clone(),
            });
        }
        GenerateMode::Tool => {
            let name = options
                .schema_name
                .clone()
                .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());
            call.tools = Some(vec![FunctionTool {
                name: name.clone(),
                description: options
                    .schema_description
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TOOL_DESCRIPTION.to_string()),
                input_schema: strategy.json_schema().unwrap_or_else(|| json!({})),
            }]);
            call.tool_choice = Some(ToolChoice::Tool { tool_name: name });
        }
    }

    call
}

async fn start(
    model: &dyn LanguageModel,
    prompt: Prompt,
    mut call: CallOptions,
) -> Result<StreamResponse, LlmError> {
    call.prompt = prompt.standardize()?;
    model.do_stream(call).await
}

async fn drive(
    model: Arc<dyn LanguageModel>,
    prompt: Prompt,
    call: CallOptions,
    transformer: ObjectStreamTransformer,
    on_finish: Option<FinishCallback>,
    handles: ResultHandles,
    controller: StitchableController<ObjectStreamPart>,
) {
    let abort = call.abort_signal.clone();

    let started = tokio::select! {
        biased;
        _ = controller.terminated() => {
            tracing::debug!("result stream dropped before the provider responded");
            handles.reject_all(&LlmError::Cancelled(
                "object stream dropped before completion".to_string(),
            ));
            return;
        }
        _ = cancelled_or_pending(abort.as_ref()) => {
            Err(LlmError::Cancelled("request aborted".to_string()))
        }
        res = start(model.as_ref(), prompt, call) => res,
    };

    match started {
        Ok(response) => {
            handles.request.resolve(response.request.unwrap_or_default());
            let transformer = transformer.with_response_headers(response.response);
            let parts = abortable_stream(response.stream, abort);
            let transformed = transform_stream(parts, transformer, on_finish);
            if let Err(e) = controller.add_stream(Box::pin(transformed)) {
                tracing::debug!("could not attach provider stream: {}", e);
            }
        }
        Err(err) => {
            tracing::debug!(
                provider = model.provider(),
                "structured output request failed before streaming: {}",
                err
            );
            handles.reject_all(&err);
            let failed = futures::stream::once(async move { Err(err) });
            if let Err(e) = controller.add_stream(Box::pin(failed)) {
                tracing::debug!("could not attach error stream: {}", e);
            }
        }
    }

    controller.close();
}
