//! Process-wide inference engine.
//!
//! A local runtime serves one model at a time, so the engine is a single
//! lazily-built slot behind a mutex. `begin()` holds that mutex for the whole
//! session: overlapping imports queue instead of interleaving turns. A failed
//! construction leaves the slot empty and the next `begin()` retries.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use super::ollama::OllamaEngineFactory;
use super::prompt::ReplyFormat;
use super::session::InferenceSession;
use super::types::{ChatEngine, EngineFactory};
use super::InferenceError;
use crate::config::ImportConfig;

type SharedEngine = Arc<dyn ChatEngine + Send + Sync>;

static SHARED: OnceLock<Arc<InferenceService>> = OnceLock::new();

// ═══════════════════════════════════════════════════════════
// InferenceService
// ═══════════════════════════════════════════════════════════

pub struct InferenceService {
    factory: Box<dyn EngineFactory + Send + Sync>,
    model: String,
    reply_format: ReplyFormat,
    engine: Mutex<Option<SharedEngine>>,
}

impl InferenceService {
    pub fn new(
        factory: Box<dyn EngineFactory + Send + Sync>,
        model: &str,
        reply_format: ReplyFormat,
    ) -> Self {
        Self {
            factory,
            model: model.to_string(),
            reply_format,
            engine: Mutex::new(None),
        }
    }

    /// Ollama-backed service for `config`.
    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(
            Box::new(
                OllamaEngineFactory::new(&config.ollama_url, config.require_gpu)
                    .with_max_context(config.max_context_tokens),
            ),
            &config.model,
            config.reply_format,
        )
    }

    /// The process-wide service. The first caller's config wins.
    pub fn shared(config: &ImportConfig) -> Arc<Self> {
        let service = SHARED.get_or_init(|| Arc::new(Self::from_config(config)));
        if service.model != config.model || service.reply_format != config.reply_format {
            tracing::debug!(
                requested = %config.model,
                active = %service.model,
                "Shared inference service already configured; keeping existing settings"
            );
        }
        Arc::clone(service)
    }

    /// Start a session for one document, building the engine on first use.
    ///
    /// Blocks while another session is open.
    pub fn begin(&self, document: &str) -> Result<InferenceSession<'_>, InferenceError> {
        let mut slot = self
            .engine
            .lock()
            .map_err(|_| InferenceError::LockPoisoned)?;

        let engine = match slot.as_ref() {
            Some(engine) => Arc::clone(engine),
            None => {
                let engine = self.factory.create(&self.model).inspect_err(|e| {
                    tracing::warn!(model = %self.model, error = %e, "Engine construction failed");
                })?;
                tracing::info!(model = %self.model, "Engine constructed");
                *slot = Some(Arc::clone(&engine));
                engine
            }
        };

        tracing::debug!(document = document, model = engine.model(), "Inference session opened");
        Ok(InferenceSession::leased(
            engine,
            self.reply_format,
            EngineLease { _slot: slot },
        ))
    }

    pub fn reply_format(&self) -> ReplyFormat {
        self.reply_format
    }
}

/// Held by a session. Dropping it releases the engine to the next caller.
pub struct EngineLease<'a> {
    _slot: MutexGuard<'a, Option<SharedEngine>>,
}
