use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::InferenceError;

/// Speaker of one conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One `{role, content}` message, the unit the engine consumes per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A constructed inference engine bound to one model.
pub trait ChatEngine {
    /// Run one turn over the full conversation and return the reply text.
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, InferenceError>;

    fn model(&self) -> &str;
}

/// Builds engines. Construction may fail when the runtime, the model, or
/// required hardware acceleration is missing.
pub trait EngineFactory {
    fn create(&self, model: &str) -> Result<Arc<dyn ChatEngine + Send + Sync>, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_as_role_and_content() {
        let json = serde_json::to_string(&ChatMessage::user("Quiz 2, Oct 3rd")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Quiz 2, Oct 3rd"}"#);
    }

    #[test]
    fn assistant_message_deserializes() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"Essay, May 1"}"#).unwrap();
        assert_eq!(msg, ChatMessage::assistant("Essay, May 1"));
    }
}
