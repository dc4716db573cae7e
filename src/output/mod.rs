//! Output strategies
//!
//! An [`OutputStrategy`] decides, per output mode, what JSON shape is
//! requested from the model, which partial values may be published while
//! text is still streaming, and what counts as a valid final result.
//!
//! | Mode       | Requested shape              | Partial                    | Final                    |
//! |------------|------------------------------|----------------------------|--------------------------|
//! | object     | caller schema                | raw value, unvalidated     | schema-validated value   |
//! | array      | `{ "elements": [..] }`       | completed elements only    | every element validated  |
//! | enum       | `{ "result": "<value>" }`    | prefix-matched candidate   | exact member             |
//! | no-schema  | none                         | raw value                  | raw value                |

mod array;
mod enumeration;
mod no_schema;
mod object;
mod schema;
mod validate;

pub use array::ArrayOutputStrategy;
pub use enumeration::EnumOutputStrategy;
pub use no_schema::NoSchemaOutputStrategy;
pub use object::ObjectOutputStrategy;
pub use schema::{DRAFT_07, JsonSchema};
pub use validate::{parse_and_validate_object_result, parse_and_validate_object_result_with_repair};

use std::sync::Arc;

use serde_json::Value;

use crate::error::LlmError;
use crate::streaming::{ElementStream, ObjectStream};
use crate::types::{FinishReason, ResponseMetadata, Usage};

/// Caller-supplied correction for malformed model output.
///
/// Receives the raw text and the parse or validation failure. Returning
/// `None` means the text cannot be repaired.
pub type RepairFn = Arc<dyn Fn(&str, &LlmError) -> Option<String> + Send + Sync>;

/// Requested output shape.
#[derive(Debug, Clone)]
pub enum OutputKind {
    /// A single JSON object matching `schema`.
    Object { schema: Value },
    /// An array whose elements each match `schema`.
    Array { schema: Value },
    /// Exactly one of `values`.
    Enum { values: Vec<String> },
    /// Any JSON value.
    NoSchema,
}

impl OutputKind {
    /// Object output for `schema`.
    pub fn object(schema: Value) -> Self {
        Self::Object { schema }
    }

    /// Array output whose elements match `schema`.
    pub fn array(schema: Value) -> Self {
        Self::Array { schema }
    }

    /// Enum output over `values`.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Which strategy this kind selects.
    pub fn output_type(&self) -> OutputType {
        match self {
            Self::Object { .. } => OutputType::Object,
            Self::Array { .. } => OutputType::Array,
            Self::Enum { .. } => OutputType::Enum,
            Self::NoSchema => OutputType::NoSchema,
        }
    }
}

/// Strategy discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Object,
    Array,
    Enum,
    NoSchema,
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Enum => "enum",
            Self::NoSchema => "no-schema",
        };
        f.write_str(s)
    }
}

/// How the structured output is requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerateMode {
    /// Let the provider decide; requested like [`GenerateMode::Json`].
    #[default]
    Auto,
    /// JSON response format carrying the schema.
    Json,
    /// A single forced function tool whose arguments are the result.
    Tool,
}

/// Input to [`OutputStrategy::validate_partial`].
#[derive(Debug, Clone, Copy)]
pub struct PartialInput<'a> {
    /// Value decoded from the accumulated text.
    pub value: &'a Value,
    /// Raw text received since the last accepted partial.
    pub text_delta: &'a str,
    /// Last accepted partial, if any.
    pub latest_object: Option<&'a Value>,
    /// No partial has been accepted yet.
    pub is_first_delta: bool,
    /// The accumulated text is complete, strictly valid JSON.
    pub is_final_delta: bool,
}

/// Accepted partial value with the text to publish alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialOutput {
    pub partial: Value,
    pub text_delta: String,
}

/// What was known about the response when final validation ran.
#[derive(Debug, Clone)]
pub struct FinalContext {
    pub text: String,
    pub response: ResponseMetadata,
    pub usage: Usage,
    pub finish_reason: FinishReason,
}

/// Per-mode validation rules.
pub trait OutputStrategy: Send + Sync + std::fmt::Debug {
    /// Strategy discriminant.
    fn output_type(&self) -> OutputType;

    /// JSON schema sent to the provider, if the mode has one.
    fn json_schema(&self) -> Option<Value>;

    /// Decide whether `input.value` may be published as a partial.
    ///
    /// A failure only withholds this update; the stream continues.
    fn validate_partial(&self, input: PartialInput<'_>) -> Result<PartialOutput, LlmError>;

    /// Validate the fully parsed value. `None` means nothing was parsed.
    fn validate_final(&self, value: Option<&Value>, ctx: &FinalContext)
    -> Result<Value, LlmError>;

    /// Text delta emitted at finish for input that no published partial
    /// covered. `closed` is set once the final partial has been published.
    fn finish_text_delta(&self, pending: String, _closed: bool, _nothing_published: bool) -> String {
        pending
    }

    /// Project the full part stream onto completed elements.
    fn create_element_stream(&self, _stream: ObjectStream) -> Result<ElementStream, LlmError> {
        Err(LlmError::UnsupportedOperation(format!(
            "element streams are only available for array output, not {}",
            self.output_type()
        )))
    }
}

/// Build the strategy for `kind`, compiling any schema up front.
pub fn output_strategy(kind: &OutputKind) -> Result<Arc<dyn OutputStrategy>, LlmError> {
    let strategy: Arc<dyn OutputStrategy> = match kind {
        OutputKind::Object { schema } => Arc::new(ObjectOutputStrategy::new(schema.clone())?),
        OutputKind::Array { schema } => Arc::new(ArrayOutputStrategy::new(schema.clone())?),
        OutputKind::Enum { values } => Arc::new(EnumOutputStrategy::new(values.clone())?),
        OutputKind::NoSchema => Arc::new(NoSchemaOutputStrategy),
    };
    Ok(strategy)
}

/// Shorthand used by strategies for a shape mismatch.
pub(crate) fn shape_error(value: &Value, cause: &str) -> LlmError {
    LlmError::type_validation(value.clone(), cause)
}
