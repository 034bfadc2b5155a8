//! Scripted engine and factory for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::types::{ChatEngine, ChatMessage, EngineFactory};
use super::InferenceError;

/// Returns queued replies in order, then empty replies.
pub struct MockChatEngine {
    replies: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<usize>>,
    calls: AtomicUsize,
    fail_on_turn: Option<usize>,
}

impl MockChatEngine {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_on_turn: None,
        }
    }

    /// Fail the given 1-based turn with an API error.
    pub fn failing_on_turn(mut self, turn: usize) -> Self {
        self.fail_on_turn = Some(turn);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Conversation length passed to each turn.
    pub fn seen_history_lengths(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

impl ChatEngine for MockChatEngine {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        let turn = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(messages.len());
        if self.fail_on_turn == Some(turn) {
            return Err(InferenceError::ApiError {
                status: 500,
                message: "model crashed".into(),
            });
        }
        Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn model(&self) -> &str {
        "mock"
    }
}

/// Hands out one shared `MockChatEngine`; can fail the first N creations.
pub struct MockEngineFactory {
    pub engine: Arc<MockChatEngine>,
    pub creates: Arc<AtomicUsize>,
    failures_left: AtomicUsize,
}

impl MockEngineFactory {
    pub fn new(engine: MockChatEngine) -> Self {
        Self::sharing(Arc::new(engine))
    }

    pub fn sharing(engine: Arc<MockChatEngine>) -> Self {
        Self {
            engine,
            creates: Arc::new(AtomicUsize::new(0)),
            failures_left: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(&self, model: &str) -> Result<Arc<dyn ChatEngine + Send + Sync>, InferenceError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(InferenceError::EngineUnavailable {
                model: model.to_string(),
                reason: "no GPU adapter found".into(),
                remediation: "GPU acceleration must be available to import documents.".into(),
            });
        }
        Ok(self.engine.clone())
    }
}
