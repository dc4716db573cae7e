//! Prompt input and message types.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Message role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A text message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Role
    pub role: MessageRole,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Prompt input: either a single text prompt or a message list, with an
/// optional system message in front.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    /// System message placed before everything else.
    pub system: Option<String>,
    /// Single user prompt.
    pub prompt: Option<String>,
    /// Full message list.
    pub messages: Option<Vec<ChatMessage>>,
}

impl Prompt {
    /// A single user prompt.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    /// A message list.
    pub fn messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Some(messages),
            ..Default::default()
        }
    }

    /// Set the system message.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Flatten into the message list sent to the provider.
    ///
    /// Exactly one of `prompt` and `messages` must be set, and a message list
    /// must not be empty.
    pub fn standardize(&self) -> Result<Vec<ChatMessage>, LlmError> {
        let mut out = Vec::new();
        if let Some(system) = &self.system {
            out.push(ChatMessage::system(system.clone()));
        }
        match (&self.prompt, &self.messages) {
            (Some(_), Some(_)) => Err(LlmError::InvalidParameter(
                "prompt and messages cannot be defined at the same time".into(),
            )),
            (None, None) => Err(LlmError::InvalidParameter(
                "prompt or messages must be defined".into(),
            )),
            (Some(prompt), None) => {
                out.push(ChatMessage::user(prompt.clone()));
                Ok(out)
            }
            (None, Some(messages)) => {
                if messages.is_empty() {
                    return Err(LlmError::InvalidParameter(
                        "messages must not be empty".into(),
                    ));
                }
                out.extend(messages.iter().cloned());
                Ok(out)
            }
        }
    }
}

impl From<&str> for Prompt {
    fn from(prompt: &str) -> Self {
        Self::text(prompt)
    }
}

impl From<String> for Prompt {
    fn from(prompt: String) -> Self {
        Self::text(prompt)
    }
}

impl From<Vec<ChatMessage>> for Prompt {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self::messages(messages)
    }
}
