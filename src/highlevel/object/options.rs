//! Request options for `stream_object`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::LlmError;
use crate::output::{GenerateMode, OutputKind, RepairFn};
use crate::types::{CallSettings, ProviderMetadata, ResponseMetadata, Usage, Warning};
use crate::utils::{CancelHandle, Clock, IdGenerator, create_id_generator, system_clock};

/// Prefix of generated response ids.
pub const RESPONSE_ID_PREFIX: &str = "aiobj";
/// Length of the random part of generated response ids.
pub const RESPONSE_ID_SIZE: usize = 24;

/// Called for every error part flowing through the result stream.
pub type ErrorCallback = Arc<dyn Fn(&LlmError) + Send + Sync>;

/// Called once the provider stream completed after a finish part.
///
/// Returning an error emits it as a final `error` part.
pub type FinishCallback = Arc<dyn Fn(ObjectFinishEvent) -> Result<(), LlmError> + Send + Sync>;

/// Summary passed to the finish callback.
#[derive(Debug, Clone)]
pub struct ObjectFinishEvent {
    /// Token usage.
    pub usage: Usage,
    /// Final value, when validation succeeded.
    pub object: Option<Value>,
    /// Final validation failure, when it did not.
    pub error: Option<LlmError>,
    /// Response metadata including headers.
    pub response: ResponseMetadata,
    /// Warnings from the provider.
    pub warnings: Vec<Warning>,
    /// Provider-specific metadata.
    pub provider_metadata: Option<ProviderMetadata>,
}

/// Options for [`stream_object`](super::stream_object).
#[derive(Clone)]
pub struct StreamObjectOptions {
    /// Requested output shape.
    pub output: OutputKind,
    /// Schema name hint (object and array output).
    pub schema_name: Option<String>,
    /// Schema description hint (object and array output).
    pub schema_description: Option<String>,
    /// How the output is requested from the provider.
    pub mode: GenerateMode,
    /// Sampling settings.
    pub settings: CallSettings,
    /// Extra HTTP headers for the provider call.
    pub headers: HashMap<String, String>,
    /// Provider-specific options, passed through.
    pub provider_options: Option<Value>,
    /// One-shot repair for malformed final output.
    pub repair_text: Option<RepairFn>,
    /// Cancels the provider call and the stream.
    pub abort_signal: Option<CancelHandle>,
    /// Error observer. Defaults to logging.
    pub on_error: Option<ErrorCallback>,
    /// Finish observer.
    pub on_finish: Option<FinishCallback>,
    /// Generates the default response id.
    pub id_generator: IdGenerator,
    /// Supplies the default response timestamp.
    pub clock: Clock,
}

impl std::fmt::Debug for StreamObjectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamObjectOptions")
            .field("output", &self.output)
            .field("schema_name", &self.schema_name)
            .field("schema_description", &self.schema_description)
            .field("mode", &self.mode)
            .field("settings", &self.settings)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("repair_text", &self.repair_text.is_some())
            .field("abort_signal", &self.abort_signal.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for StreamObjectOptions {
    fn default() -> Self {
        Self::new(OutputKind::NoSchema)
    }
}

impl StreamObjectOptions {
    pub fn new(output: OutputKind) -> Self {
        Self {
            output,
            schema_name: None,
            schema_description: None,
            mode: GenerateMode::default(),
            settings: CallSettings::default(),
            headers: HashMap::new(),
            provider_options: None,
            repair_text: None,
            abort_signal: None,
            on_error: None,
            on_finish: None,
            id_generator: create_id_generator(RESPONSE_ID_PREFIX, RESPONSE_ID_SIZE),
            clock: system_clock(),
        }
    }

    /// Object output validated against `schema`.
    pub fn object(schema: Value) -> Self {
        Self::new(OutputKind::object(schema))
    }

    /// Array output whose elements match `schema`.
    pub fn array(schema: Value) -> Self {
        Self::new(OutputKind::array(schema))
    }

    /// Output restricted to one of `values`.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OutputKind::enumeration(values))
    }

    /// Unvalidated JSON output.
    pub fn no_schema() -> Self {
        Self::new(OutputKind::NoSchema)
    }

    pub fn with_schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    pub fn with_schema_description(mut self, description: impl Into<String>) -> Self {
        self.schema_description = Some(description.into());
        self
    }

    pub fn with_mode(mut self, mode: GenerateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_settings(mut self, settings: CallSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_provider_options(mut self, options: Value) -> Self {
        self.provider_options = Some(options);
        self
    }

    pub fn with_repair<F>(mut self, repair: F) -> Self
    where
        F: Fn(&str, &LlmError) -> Option<String> + Send + Sync + 'static,
    {
        self.repair_text = Some(Arc::new(repair));
        self
    }

    pub fn with_abort_signal(mut self, signal: CancelHandle) -> Self {
        self.abort_signal = Some(signal);
        self
    }

    pub fn with_on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LlmError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn with_on_finish<F>(mut self, callback: F) -> Self
    where
        F: Fn(ObjectFinishEvent) -> Result<(), LlmError> + Send + Sync + 'static,
    {
        self.on_finish = Some(Arc::new(callback));
        self
    }

    pub fn with_id_generator(mut self, id_generator: IdGenerator) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Reject option combinations the output mode cannot honour.
    ///
    /// Schemas and enum values are checked when the strategy is built.
    pub(crate) fn validate(&self) -> Result<(), LlmError> {
        let has_schema_hints = self.schema_name.is_some() || self.schema_description.is_some();
        let output = self.output.output_type();

        if matches!(self.output, OutputKind::Enum { .. } | OutputKind::NoSchema) {
            if has_schema_hints {
                return Err(LlmError::InvalidParameter(format!(
                    "schema name and description are not supported for {output} output"
                )));
            }
            if self.mode == GenerateMode::Tool {
                return Err(LlmError::InvalidParameter(format!(
                    "tool mode is not supported for {output} output"
                )));
            }
        }

        Ok(())
    }
}
