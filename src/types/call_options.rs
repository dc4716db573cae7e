//! Options passed to the provider adapter for a single streaming call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompt::ChatMessage;
use crate::utils::cancel::CancelHandle;

/// Common sampling settings forwarded to the provider untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallSettings {
    /// Maximum number of tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Presence penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    /// Frequency penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Random seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Requested response format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Free text.
    Text,
    /// JSON, optionally constrained by a schema.
    Json {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// A function tool offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema of the tool input.
    pub input_schema: Value,
}

/// Tool selection constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    /// Force a specific tool.
    Tool { tool_name: String },
}

/// Everything a provider adapter needs to start one streaming call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Standardized prompt.
    pub prompt: Vec<ChatMessage>,
    /// Response format (JSON mode).
    pub response_format: Option<ResponseFormat>,
    /// Tools (tool mode).
    pub tools: Option<Vec<FunctionTool>>,
    /// Tool choice (tool mode).
    pub tool_choice: Option<ToolChoice>,
    /// Sampling settings.
    pub settings: CallSettings,
    /// Extra HTTP headers.
    pub headers: HashMap<String, String>,
    /// Provider-specific options, passed through.
    pub provider_options: Option<Value>,
    /// Cancellation signal; adapters should stop work once it fires.
    pub abort_signal: Option<CancelHandle>,
}
