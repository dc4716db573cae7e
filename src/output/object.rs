//! Object output: partials pass through, the final value is schema-checked.

use serde_json::Value;

use super::{FinalContext, JsonSchema, OutputStrategy, OutputType, PartialInput, PartialOutput};
use crate::error::LlmError;

/// Strategy for a single JSON object.
#[derive(Debug, Clone)]
pub struct ObjectOutputStrategy {
    schema: JsonSchema,
}

impl ObjectOutputStrategy {
    pub fn new(schema: Value) -> Result<Self, LlmError> {
        Ok(Self {
            schema: JsonSchema::compile(schema)?,
        })
    }
}

impl OutputStrategy for ObjectOutputStrategy {
    fn output_type(&self) -> OutputType {
        OutputType::Object
    }

    fn json_schema(&self) -> Option<Value> {
        Some(self.schema.as_value().clone())
    }

    fn validate_partial(&self, input: PartialInput<'_>) -> Result<PartialOutput, LlmError> {
        // Incomplete JSON cannot satisfy `required`, so partials are not validated.
        Ok(PartialOutput {
            partial: input.value.clone(),
            text_delta: input.text_delta.to_string(),
        })
    }

    fn validate_final(
        &self,
        value: Option<&Value>,
        _ctx: &FinalContext,
    ) -> Result<Value, LlmError> {
        let value = value
            .ok_or_else(|| LlmError::type_validation(Value::Null, "no value was parsed"))?;
        self.schema.validate(value)?;
        Ok(value.clone())
    }
}
