use std::sync::Arc;

use super::prompt::ReplyFormat;
use super::service::EngineLease;
use super::types::{ChatEngine, ChatMessage};
use super::InferenceError;

/// One document's conversation with the engine.
///
/// History is one system message followed by a user/assistant pair per chunk
/// sent. It lives only as long as the session; the engine outlives it.
pub struct InferenceSession<'a> {
    engine: Arc<dyn ChatEngine + Send + Sync>,
    history: Vec<ChatMessage>,
    _lease: Option<EngineLease<'a>>,
}

impl<'a> InferenceSession<'a> {
    pub(crate) fn leased(
        engine: Arc<dyn ChatEngine + Send + Sync>,
        format: ReplyFormat,
        lease: EngineLease<'a>,
    ) -> Self {
        Self {
            engine,
            history: vec![ChatMessage::system(format.system_prompt())],
            _lease: Some(lease),
        }
    }
}

impl InferenceSession<'static> {
    /// Session over an engine outside any service (no exclusivity).
    pub fn standalone(engine: Arc<dyn ChatEngine + Send + Sync>, format: ReplyFormat) -> Self {
        Self {
            engine,
            history: vec![ChatMessage::system(format.system_prompt())],
            _lease: None,
        }
    }
}

impl InferenceSession<'_> {
    /// Send one chunk as a user turn and record the reply.
    ///
    /// On failure the pending user message is discarded so the history
    /// still holds only complete turns.
    pub fn send(&mut self, chunk: &str) -> Result<String, InferenceError> {
        self.history.push(ChatMessage::user(chunk));

        match self.engine.chat(&self.history) {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }
}
