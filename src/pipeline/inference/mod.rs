pub mod types;
pub mod prompt;
pub mod ollama;
pub mod hardware;
pub mod session;
pub mod service;
#[cfg(test)]
pub mod mock;

pub use types::*;
pub use prompt::*;
pub use ollama::*;
pub use hardware::*;
pub use session::*;
pub use service::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    /// The process-wide engine could not be constructed. Not cached: the next
    /// `begin()` tries again.
    #[error("Inference engine unavailable for model '{model}': {reason}")]
    EngineUnavailable {
        model: String,
        reason: String,
        remediation: String,
    },

    #[error("Ollama is not running at {0}")]
    NotReachable(String),

    #[error("Ollama returned an error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Model '{0}' is not installed")]
    ModelNotFound(String),

    #[error("Only localhost connections are allowed for security")]
    NonLocalEndpoint,

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Unknown reply format '{0}' (expected comma-v1 or pipe-v2)")]
    UnknownReplyFormat(String),

    #[error("Internal lock error")]
    LockPoisoned,
}

impl InferenceError {
    /// Wrap a construction-time failure with remediation text for the user.
    pub fn engine_unavailable(model: &str, cause: &InferenceError) -> Self {
        let remediation = match cause {
            Self::NotReachable(_) | Self::Network(_) => {
                "Start the local Ollama runtime (`ollama serve`) and try again.".to_string()
            }
            Self::ModelNotFound(m) => format!("Install the model with `ollama pull {m}`."),
            Self::NonLocalEndpoint | Self::InvalidUrl => {
                "Point COURSEPLAN_OLLAMA_URL at a localhost address.".to_string()
            }
            _ => "Check that Ollama is running and the model loads.".to_string(),
        };
        Self::EngineUnavailable {
            model: model.to_string(),
            reason: cause.to_string(),
            remediation,
        }
    }

    pub fn is_engine_unavailable(&self) -> bool {
        matches!(self, Self::EngineUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_runtime_suggests_starting_ollama() {
        let err = InferenceError::engine_unavailable(
            "llama3.2:3b",
            &InferenceError::NotReachable("http://localhost:11434".into()),
        );
        match err {
            InferenceError::EngineUnavailable {
                model,
                reason,
                remediation,
            } => {
                assert_eq!(model, "llama3.2:3b");
                assert!(reason.contains("localhost:11434"));
                assert!(remediation.contains("ollama serve"));
            }
            other => panic!("expected EngineUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn missing_model_suggests_pull() {
        let err = InferenceError::engine_unavailable(
            "llama3.2:3b",
            &InferenceError::ModelNotFound("llama3.2:3b".into()),
        );
        assert!(err.is_engine_unavailable());
        assert!(matches!(
            err,
            InferenceError::EngineUnavailable { ref remediation, .. }
                if remediation.contains("ollama pull llama3.2:3b")
        ));
    }
}
