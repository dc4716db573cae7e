//! Common result types: usage, finish reason, metadata and warnings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider metadata keyed by provider name.
///
/// Kept permissive so provider-specific data survives untouched.
pub type ProviderMetadata = serde_json::Map<String, serde_json::Value>;

/// Token usage for a single request.
///
/// Every counter is optional: providers report different subsets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Input tokens used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    /// Output tokens generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    /// Total tokens used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    /// Reasoning tokens (for reasoning models)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
    /// Input tokens served from a prompt cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_input_tokens: Option<u64>,
}

impl Usage {
    /// Usage with input/output counts and a derived total.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            total_tokens: Some(input_tokens + output_tokens),
            reasoning_tokens: None,
            cached_input_tokens: None,
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Model hit the output token limit.
    Length,
    /// Output was blocked by a content filter.
    ContentFilter,
    /// Model triggered tool calls.
    ToolCalls,
    /// Generation stopped because of an error.
    Error,
    /// Provider-specific reason that does not map to a standard category.
    Other(String),
    /// The provider did not report a reason.
    ///
    /// Also used when a stream ends without a finish part.
    #[default]
    Unknown,
}

/// Request metadata reported by the provider adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestMetadata {
    /// Raw request body as sent to the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Response headers reported by the provider adapter.
pub type ResponseHeaders = HashMap<String, String>;

/// Response metadata for a streamed request.
///
/// Starts from generated defaults and is refined by every
/// `response-metadata` part the provider sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Response id.
    pub id: String,
    /// Response creation time.
    pub timestamp: DateTime<Utc>,
    /// Model that produced the response.
    pub model_id: String,
    /// Response headers, when the adapter exposes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<ResponseHeaders>,
}

impl ResponseMetadata {
    /// Metadata without headers.
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, model_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            model_id: model_id.into(),
            headers: None,
        }
    }

    /// Override the fields a provider update carries.
    pub fn merge(
        &mut self,
        id: Option<String>,
        timestamp: Option<DateTime<Utc>>,
        model_id: Option<String>,
    ) {
        if let Some(id) = id {
            self.id = id;
        }
        if let Some(timestamp) = timestamp {
            self.timestamp = timestamp;
        }
        if let Some(model_id) = model_id {
            self.model_id = model_id;
        }
    }
}

/// Warning reported by the provider (e.g. unsupported settings).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Warning {
    /// A setting is not supported by the provider.
    UnsupportedSetting {
        setting: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// A feature is only partially supported.
    Compatibility {
        feature: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Anything else.
    Other { message: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedSetting { setting, details } => {
                write!(f, "unsupported setting `{setting}`")?;
                if let Some(details) = details {
                    write!(f, ": {details}")?;
                }
                Ok(())
            }
            Self::Compatibility { feature, details } => {
                write!(f, "compatibility mode for `{feature}`")?;
                if let Some(details) = details {
                    write!(f, ": {details}")?;
                }
                Ok(())
            }
            Self::Other { message } => f.write_str(message),
        }
    }
}
