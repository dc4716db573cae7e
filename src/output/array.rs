//! Array output
//!
//! Most models cannot reliably emit a bare top-level array, so the request
//! asks for `{ "elements": [...] }`. While streaming, the last element of the
//! decoded array may still be incomplete and is held back until either a
//! later element starts or the text is complete.

use futures::StreamExt;
use serde_json::{Value, json};

use super::{
    DRAFT_07, FinalContext, JsonSchema, OutputStrategy, OutputType, PartialInput, PartialOutput,
    shape_error,
};
use crate::error::LlmError;
use crate::streaming::{ElementStream, ObjectStream};
use crate::types::ObjectStreamPart;

/// Strategy for an array of schema-checked elements.
#[derive(Debug, Clone)]
pub struct ArrayOutputStrategy {
    element: JsonSchema,
}

impl ArrayOutputStrategy {
    /// `schema` describes a single element.
    pub fn new(schema: Value) -> Result<Self, LlmError> {
        Ok(Self {
            element: JsonSchema::compile(schema)?,
        })
    }

    fn elements<'v>(value: &'v Value) -> Result<&'v Vec<Value>, LlmError> {
        value
            .as_object()
            .and_then(|obj| obj.get("elements"))
            .and_then(Value::as_array)
            .ok_or_else(|| shape_error(value, "value must be an object that contains an array of elements"))
    }
}

impl OutputStrategy for ArrayOutputStrategy {
    fn output_type(&self) -> OutputType {
        OutputType::Array
    }

    fn json_schema(&self) -> Option<Value> {
        let mut items = self.element.as_value().clone();
        if let Some(obj) = items.as_object_mut() {
            obj.remove("$schema");
        }
        Some(json!({
            "$schema": DRAFT_07,
            "type": "object",
            "properties": {
                "elements": { "type": "array", "items": items }
            },
            "required": ["elements"],
            "additionalProperties": false
        }))
    }

    fn validate_partial(&self, input: PartialInput<'_>) -> Result<PartialOutput, LlmError> {
        let elements = Self::elements(input.value)?;

        let mut completed = Vec::with_capacity(elements.len());
        for (idx, element) in elements.iter().enumerate() {
            if idx + 1 == elements.len() && !input.is_final_delta {
                continue;
            }
            self.element.validate(element)?;
            completed.push(element.clone());
        }

        let published = input
            .latest_object
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        let mut text_delta = String::new();
        if input.is_first_delta {
            text_delta.push('[');
        }
        if published > 0 {
            text_delta.push(',');
        }
        let fresh: Vec<String> = completed
            .iter()
            .skip(published)
            .map(Value::to_string)
            .collect();
        text_delta.push_str(&fresh.join(","));
        if input.is_final_delta {
            text_delta.push(']');
        }

        Ok(PartialOutput {
            partial: Value::Array(completed),
            text_delta,
        })
    }

    fn validate_final(
        &self,
        value: Option<&Value>,
        _ctx: &FinalContext,
    ) -> Result<Value, LlmError> {
        let value = value
            .ok_or_else(|| LlmError::type_validation(Value::Null, "no value was parsed"))?;
        let elements = Self::elements(value)?;
        for element in elements {
            self.element.validate(element)?;
        }
        Ok(Value::Array(elements.clone()))
    }

    /// The text stream is the serialized published array, so raw provider
    /// text is never flushed; only the missing brackets are.
    fn finish_text_delta(&self, _pending: String, closed: bool, nothing_published: bool) -> String {
        match (closed, nothing_published) {
            (true, _) => String::new(),
            (false, true) => "[]".to_string(),
            (false, false) => "]".to_string(),
        }
    }

    fn create_element_stream(&self, stream: ObjectStream) -> Result<ElementStream, LlmError> {
        let elements = async_stream::stream! {
            let mut stream = stream;
            let mut published = 0usize;
            while let Some(part) = stream.next().await {
                match part {
                    ObjectStreamPart::Object { object: Value::Array(items) } => {
                        for item in items.into_iter().skip(published) {
                            published += 1;
                            yield item;
                        }
                    }
                    ObjectStreamPart::Object { .. }
                    | ObjectStreamPart::StreamStart { .. }
                    | ObjectStreamPart::TextDelta { .. }
                    | ObjectStreamPart::ResponseMetadata { .. }
                    | ObjectStreamPart::Finish { .. }
                    | ObjectStreamPart::Error { .. } => {}
                }
            }
        };
        Ok(Box::pin(elements))
    }
}
