//! Enum output
//!
//! The request asks for `{ "result": "<value>" }`. While the string is still
//! streaming, the prefix is matched against the allowed values: one match is
//! published as the full value, several matches publish the raw prefix, and
//! no match withholds the update.

use serde_json::{Value, json};

use super::{
    DRAFT_07, FinalContext, OutputStrategy, OutputType, PartialInput, PartialOutput, shape_error,
};
use crate::error::LlmError;

/// Strategy for exactly one of a fixed set of strings.
#[derive(Debug, Clone)]
pub struct EnumOutputStrategy {
    values: Vec<String>,
}

impl EnumOutputStrategy {
    /// Fails if `values` is empty.
    pub fn new(values: Vec<String>) -> Result<Self, LlmError> {
        if values.is_empty() {
            return Err(LlmError::InvalidParameter(
                "enum output requires at least one value".to_string(),
            ));
        }
        Ok(Self { values })
    }

    /// Allowed values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn result<'v>(value: &'v Value) -> Result<&'v str, LlmError> {
        value
            .as_object()
            .and_then(|obj| obj.get("result"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                shape_error(
                    value,
                    "value must be an object that contains a string in the \"result\" property",
                )
            })
    }
}

impl OutputStrategy for EnumOutputStrategy {
    fn output_type(&self) -> OutputType {
        OutputType::Enum
    }

    fn json_schema(&self) -> Option<Value> {
        Some(json!({
            "$schema": DRAFT_07,
            "type": "object",
            "properties": {
                "result": { "type": "string", "enum": self.values }
            },
            "required": ["result"],
            "additionalProperties": false
        }))
    }

    fn validate_partial(&self, input: PartialInput<'_>) -> Result<PartialOutput, LlmError> {
        let prefix = Self::result(input.value)?;
        let candidates: Vec<&String> = self
            .values
            .iter()
            .filter(|v| v.starts_with(prefix))
            .collect();

        if prefix.is_empty() || candidates.is_empty() {
            tracing::trace!(
                prefix,
                "enum prefix matches no allowed value, withholding partial"
            );
            return Err(shape_error(input.value, "value must be a string in the enum"));
        }

        let partial = match candidates.as_slice() {
            [only] => Value::String((*only).clone()),
            _ => Value::String(prefix.to_string()),
        };

        Ok(PartialOutput {
            partial,
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
        let result = Self::result(value)?;
        if self.values.iter().any(|v| v == result) {
            Ok(Value::String(result.to_string()))
        } else {
            Err(shape_error(value, "value must be a string in the enum"))
        }
    }
}
