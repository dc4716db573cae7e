//! Compiled JSON Schema
//!
//! Schemas are compiled once per request and reused for every partial and
//! final validation.
//!
//! ```rust,ignore
//! use siumai_object::output::JsonSchema;
//! use serde_json::json;
//!
//! let schema = JsonSchema::compile(json!({ "type": "string" }))?;
//! schema.validate(&json!("hello"))?;
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::error::LlmError;

/// Draft used for the wrapper schemas this crate generates.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// How many validation messages are folded into one error.
const MAX_REPORTED_ERRORS: usize = 3;

/// A JSON Schema together with its compiled validator.
#[derive(Clone)]
pub struct JsonSchema {
    schema: Value,
    validator: Arc<jsonschema::Validator>,
}

impl std::fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchema")
            .field("schema", &self.schema)
            .finish()
    }
}

impl JsonSchema {
    /// Compile a schema.
    ///
    /// Fails with `LlmError::SchemaError` if the schema itself is invalid.
    pub fn compile(schema: Value) -> Result<Self, LlmError> {
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| LlmError::SchemaError(format!("Invalid JSON Schema: {}", e)))?;
        Ok(Self {
            schema,
            validator: Arc::new(validator),
        })
    }

    /// The raw schema document.
    pub fn as_value(&self) -> &Value {
        &self.schema
    }

    /// Whether `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate `instance`, reporting up to three violations.
    pub fn validate(&self, instance: &Value) -> Result<(), LlmError> {
        if self.validator.is_valid(instance) {
            return Ok(());
        }

        let msgs: Vec<String> = self
            .validator
            .iter_errors(instance)
            .take(MAX_REPORTED_ERRORS)
            .map(|err| format!("{} at {}", err, err.instance_path))
            .collect();

        Err(LlmError::type_validation(instance.clone(), msgs.join("; ")))
    }
}
