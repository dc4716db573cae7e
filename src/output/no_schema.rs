//! No-schema output: any JSON value is accepted.

use serde_json::Value;

use super::{FinalContext, OutputStrategy, OutputType, PartialInput, PartialOutput};
use crate::error::{LlmError, NoObjectGeneratedError};

/// Strategy that accepts whatever JSON the model produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchemaOutputStrategy;

impl OutputStrategy for NoSchemaOutputStrategy {
    fn output_type(&self) -> OutputType {
        OutputType::NoSchema
    }

    fn json_schema(&self) -> Option<Value> {
        None
    }

    fn validate_partial(&self, input: PartialInput<'_>) -> Result<PartialOutput, LlmError> {
        Ok(PartialOutput {
            partial: input.value.clone(),
            text_delta: input.text_delta.to_string(),
        })
    }

    fn validate_final(&self, value: Option<&Value>, ctx: &FinalContext) -> Result<Value, LlmError> {
        match value {
            Some(value) => Ok(value.clone()),
            None => Err(NoObjectGeneratedError::new(
                "No object generated: response did not match schema.",
            )
            .with_text(ctx.text.clone())
            .with_context(ctx.response.clone(), ctx.usage.clone(), ctx.finish_reason.clone())
            .into()),
        }
    }
}
