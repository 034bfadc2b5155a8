use std::path::PathBuf;

use crate::pipeline::inference::{
    validate_base_url, InferenceError, ReplyFormat, DEFAULT_MAX_CONTEXT_TOKENS,
};

/// Application-level constants
pub const APP_NAME: &str = "Courseplan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "llama3.2:3b-instruct-q4_K_M";

/// Local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// One inference turn carries at most this many words of document text.
pub const DEFAULT_CHUNK_WORDS: usize = 2500;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,courseplan_lib=debug"
}

/// Get the application data directory
/// ~/Courseplan/ on all platforms. Falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database holding imported calendar events.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("events.db")
}

/// Runtime settings for the import pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    /// Model identifier handed to the inference engine at construction.
    pub model: String,
    /// Ollama base URL (loopback only).
    pub ollama_url: String,
    /// Word budget per inference turn.
    pub chunk_words: usize,
    /// Expected grammar of the model's reply.
    pub reply_format: ReplyFormat,
    /// Refuse to run inference on CPU-only hardware.
    pub require_gpu: bool,
    /// Upper bound on the context window requested per turn. The window
    /// grows with the session history up to this value.
    pub max_context_tokens: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            chunk_words: DEFAULT_CHUNK_WORDS,
            reply_format: ReplyFormat::default(),
            require_gpu: false,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
        }
    }
}

impl ImportConfig {
    /// Build from `COURSEPLAN_*` environment variables, falling back to defaults.
    ///
    /// - `COURSEPLAN_MODEL`
    /// - `COURSEPLAN_OLLAMA_URL`
    /// - `COURSEPLAN_CHUNK_WORDS`
    /// - `COURSEPLAN_REPLY_FORMAT` (`comma-v1` | `pipe-v2`)
    /// - `COURSEPLAN_REQUIRE_GPU` (`1`/`true`)
    /// - `COURSEPLAN_MAX_CONTEXT` (tokens)
    pub fn from_env() -> Result<Self, InferenceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup (tests avoid mutating the
    /// process environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InferenceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(model) = lookup("COURSEPLAN_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }

        if let Some(url) = lookup("COURSEPLAN_OLLAMA_URL") {
            config.ollama_url = url.trim().trim_end_matches('/').to_string();
        }
        validate_base_url(&config.ollama_url)?;

        if let Some(words) = lookup("COURSEPLAN_CHUNK_WORDS") {
            match words.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.chunk_words = n,
                _ => tracing::warn!(
                    value = %words,
                    default = DEFAULT_CHUNK_WORDS,
                    "Ignoring invalid COURSEPLAN_CHUNK_WORDS"
                ),
            }
        }

        if let Some(format) = lookup("COURSEPLAN_REPLY_FORMAT") {
            match format.trim().parse::<ReplyFormat>() {
                Ok(f) => config.reply_format = f,
                Err(_) => tracing::warn!(value = %format, "Ignoring unknown COURSEPLAN_REPLY_FORMAT"),
            }
        }

        if let Some(flag) = lookup("COURSEPLAN_REQUIRE_GPU") {
            config.require_gpu = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Some(tokens) = lookup("COURSEPLAN_MAX_CONTEXT") {
            match tokens.trim().parse::<u32>() {
                Ok(n) if n > 0 => config.max_context_tokens = n,
                _ => tracing::warn!(
                    value = %tokens,
                    default = DEFAULT_MAX_CONTEXT_TOKENS,
                    "Ignoring invalid COURSEPLAN_MAX_CONTEXT"
                ),
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Courseplan"));
    }

    #[test]
    fn database_lives_under_app_data() {
        let db = default_database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("events.db"));
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = ImportConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.chunk_words, 2500);
        assert_eq!(config.reply_format, ReplyFormat::CommaV1);
        assert!(!config.require_gpu);
    }

    #[test]
    fn environment_overrides_apply() {
        let config = ImportConfig::from_lookup(lookup_from(&[
            ("COURSEPLAN_MODEL", "qwen2.5:7b"),
            ("COURSEPLAN_OLLAMA_URL", "http://127.0.0.1:11500/"),
            ("COURSEPLAN_CHUNK_WORDS", "1200"),
            ("COURSEPLAN_REPLY_FORMAT", "pipe-v2"),
            ("COURSEPLAN_REQUIRE_GPU", "true"),
            ("COURSEPLAN_MAX_CONTEXT", "65536"),
        ]))
        .unwrap();

        assert_eq!(config.model, "qwen2.5:7b");
        assert_eq!(config.ollama_url, "http://127.0.0.1:11500");
        assert_eq!(config.chunk_words, 1200);
        assert_eq!(config.reply_format, ReplyFormat::PipeV2);
        assert!(config.require_gpu);
        assert_eq!(config.max_context_tokens, 65_536);
    }

    #[test]
    fn invalid_context_ceiling_is_ignored() {
        let config =
            ImportConfig::from_lookup(lookup_from(&[("COURSEPLAN_MAX_CONTEXT", "lots")])).unwrap();
        assert_eq!(config.max_context_tokens, DEFAULT_MAX_CONTEXT_TOKENS);
    }

    #[test]
    fn zero_chunk_budget_is_ignored() {
        let config =
            ImportConfig::from_lookup(lookup_from(&[("COURSEPLAN_CHUNK_WORDS", "0")])).unwrap();
        assert_eq!(config.chunk_words, DEFAULT_CHUNK_WORDS);
    }

    #[test]
    fn remote_ollama_url_rejected() {
        let result = ImportConfig::from_lookup(lookup_from(&[(
            "COURSEPLAN_OLLAMA_URL",
            "http://inference.example.com:11434",
        )]));
        assert!(matches!(result, Err(InferenceError::NonLocalEndpoint)));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
