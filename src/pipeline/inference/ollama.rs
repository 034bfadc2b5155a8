use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::hardware::{detect_hardware, GpuTier};
use super::types::{ChatEngine, ChatMessage, EngineFactory};
use super::InferenceError;

/// Connect timeout only. Turns on CPU can take minutes, so no request timeout.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Deterministic extraction.
const TEMPERATURE: f32 = 0.1;

/// Smallest window requested; Ollama's own default.
const MIN_CONTEXT_TOKENS: u32 = 4096;
/// Room left for the model's reply on top of the prompt.
const REPLY_RESERVE_TOKENS: u32 = 1024;
/// Chat template framing per message.
const MESSAGE_OVERHEAD_TOKENS: u32 = 8;

/// Ceiling used when none is configured.
pub const DEFAULT_MAX_CONTEXT_TOKENS: u32 = 32_768;

/// Validate that an Ollama base URL points at the local machine.
///
/// Only `localhost`, `127.0.0.1` and `::1` are accepted, over http or https.
pub fn validate_base_url(url: &str) -> Result<(), InferenceError> {
    let after_scheme = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or(InferenceError::InvalidUrl)?;

    let host = if let Some(bracketed) = after_scheme.strip_prefix('[') {
        bracketed.split(']').next().unwrap_or("")
    } else {
        after_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or("")
    };

    match host {
        "localhost" | "127.0.0.1" | "::1" => Ok(()),
        "" => Err(InferenceError::InvalidUrl),
        _ => Err(InferenceError::NonLocalEndpoint),
    }
}

// ═══════════════════════════════════════════════════════════
// Context window sizing
// ═══════════════════════════════════════════════════════════

/// Window requested for one chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    /// Prompt estimate plus reply reserve.
    pub needed_tokens: u32,
    /// `num_ctx` sent to Ollama.
    pub num_ctx: u32,
}

impl ContextWindow {
    pub fn truncates(&self) -> bool {
        self.needed_tokens > self.num_ctx
    }
}

/// Rough token count for a conversation (about 4 tokens per 3 words of
/// English text, plus template framing).
pub fn estimate_tokens(messages: &[ChatMessage]) -> u32 {
    let total: usize = messages
        .iter()
        .map(|m| {
            let words = m.content.split_whitespace().count();
            (words * 4).div_ceil(3) + MESSAGE_OVERHEAD_TOKENS as usize
        })
        .sum();
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Size the window so the whole history fits. Grows in powers of two to
/// limit model reloads across a session, capped at `max_tokens`.
pub fn context_window(messages: &[ChatMessage], max_tokens: u32) -> ContextWindow {
    let needed_tokens = estimate_tokens(messages).saturating_add(REPLY_RESERVE_TOKENS);
    let ceiling = max_tokens.max(MIN_CONTEXT_TOKENS);
    let num_ctx = needed_tokens
        .checked_next_power_of_two()
        .unwrap_or(u32::MAX)
        .clamp(MIN_CONTEXT_TOKENS, ceiling);
    ContextWindow {
        needed_tokens,
        num_ctx,
    }
}

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: GenerationOptions,
}

#[derive(Serialize)]
struct GenerationOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    /// Absent when the request only loaded the model.
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Deserialize)]
struct PsResponse {
    #[serde(default)]
    models: Vec<RunningModelInfo>,
}

/// A model currently loaded in Ollama's memory (from `/api/ps`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningModelInfo {
    pub name: String,
    /// Total size in memory (bytes).
    #[serde(default)]
    pub size: u64,
    /// Portion resident in VRAM (bytes). 0 = CPU only.
    #[serde(default)]
    pub size_vram: u64,
}

// ═══════════════════════════════════════════════════════════
// OllamaClient
// ═══════════════════════════════════════════════════════════

/// Blocking HTTP client for a local Ollama runtime.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    max_context_tokens: u32,
}

impl OllamaClient {
    /// Create a client for a loopback base URL.
    pub fn new(base_url: &str) -> Result<Self, InferenceError> {
        let base_url = base_url.trim_end_matches('/');
        validate_base_url(base_url)?;

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(None)
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.to_string(),
            client,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
        })
    }

    /// Cap the context window requested per turn.
    pub fn with_max_context(mut self, tokens: u32) -> Self {
        self.max_context_tokens = tokens;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_context_tokens(&self) -> u32 {
        self.max_context_tokens
    }

    /// Installed model names (`/api/tags`).
    pub fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let parsed: TagsResponse = Self::read_json(response)?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    /// Whether `model` is installed. An untagged name matches its `:latest` tag.
    pub fn is_model_available(&self, model: &str) -> Result<bool, InferenceError> {
        let latest = format!("{model}:latest");
        Ok(self
            .list_models()?
            .iter()
            .any(|name| name == model || *name == latest))
    }

    /// Models currently loaded in memory (`/api/ps`).
    pub fn list_running_models(&self) -> Result<Vec<RunningModelInfo>, InferenceError> {
        let response = self
            .client
            .get(format!("{}/api/ps", self.base_url))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let parsed: PsResponse = Self::read_json(response)?;
        Ok(parsed.models)
    }

    /// One non-streaming `/api/chat` turn. An empty message list only loads
    /// the model and yields an empty reply.
    pub fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        let window = context_window(messages, self.max_context_tokens);
        if window.truncates() {
            tracing::warn!(
                needed_tokens = window.needed_tokens,
                num_ctx = window.num_ctx,
                messages = messages.len(),
                "Conversation exceeds the context window; Ollama will drop the oldest turns. \
                 Raise COURSEPLAN_MAX_CONTEXT or lower COURSEPLAN_CHUNK_WORDS"
            );
        }

        let body = ChatRequest {
            model,
            messages,
            stream: false,
            options: GenerationOptions {
                temperature: TEMPERATURE,
                num_ctx: window.num_ctx,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        let parsed: ChatResponse = Self::read_json(response)?;
        Ok(parsed.message.map(|m| m.content).unwrap_or_default())
    }

    // ── Internal ────────────────────────────────────────────

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_connect() {
            InferenceError::NotReachable(self.base_url.clone())
        } else {
            InferenceError::Network(e.to_string())
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::blocking::Response,
    ) -> Result<T, InferenceError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(InferenceError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .map_err(|e| InferenceError::ResponseParsing(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════
// Engine + factory
// ═══════════════════════════════════════════════════════════

/// Ollama-backed engine for one model.
pub struct OllamaChatEngine {
    client: OllamaClient,
    model: String,
}

impl ChatEngine for OllamaChatEngine {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        let _span = tracing::debug_span!("ollama_chat", model = %self.model).entered();
        let reply = self.client.chat(&self.model, messages)?;
        tracing::debug!(messages = messages.len(), reply_chars = reply.len(), "Turn complete");
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Builds `OllamaChatEngine`s after checking the runtime is reachable, the
/// model is installed and, optionally, that inference runs on a GPU.
pub struct OllamaEngineFactory {
    base_url: String,
    require_gpu: bool,
    max_context_tokens: u32,
}

impl OllamaEngineFactory {
    pub fn new(base_url: &str, require_gpu: bool) -> Self {
        Self {
            base_url: base_url.to_string(),
            require_gpu,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
        }
    }

    pub fn with_max_context(mut self, tokens: u32) -> Self {
        self.max_context_tokens = tokens;
        self
    }

    fn try_create(&self, model: &str) -> Result<OllamaChatEngine, InferenceError> {
        let client = OllamaClient::new(&self.base_url)?.with_max_context(self.max_context_tokens);

        if !client.is_model_available(model)? {
            return Err(InferenceError::ModelNotFound(model.to_string()));
        }

        Ok(OllamaChatEngine {
            client,
            model: model.to_string(),
        })
    }

    /// Load the model, then read where Ollama placed it.
    fn check_acceleration(&self, engine: &OllamaChatEngine) -> Result<(), InferenceError> {
        engine.client.chat(&engine.model, &[])?;
        let profile = detect_hardware(&engine.client);
        if profile.gpu_tier() == GpuTier::CpuOnly {
            return Err(InferenceError::EngineUnavailable {
                model: engine.model.clone(),
                reason: format!("inference would run on {}", profile.processor_label),
                remediation: "GPU acceleration must be available to import documents. \
                              Enable GPU support for Ollama, or unset COURSEPLAN_REQUIRE_GPU."
                    .to_string(),
            });
        }
        Ok(())
    }
}

impl EngineFactory for OllamaEngineFactory {
    fn create(&self, model: &str) -> Result<Arc<dyn ChatEngine + Send + Sync>, InferenceError> {
        let _span = tracing::info_span!("engine_create", model = model).entered();

        let engine = self
            .try_create(model)
            .map_err(|e| InferenceError::engine_unavailable(model, &e))?;

        if self.require_gpu {
            self.check_acceleration(&engine).map_err(|e| match e {
                e @ InferenceError::EngineUnavailable { .. } => e,
                other => InferenceError::engine_unavailable(model, &other),
            })?;
        }

        tracing::info!(
            base_url = %self.base_url,
            max_context_tokens = self.max_context_tokens,
            "Inference engine ready"
        );
        Ok(Arc::new(engine))
    }
}
