use thiserror::Error;

/// Failures surfaced by an orchestrator run. Every variant converts into the
/// `error` field of the operation state and exactly one user-visible signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    #[error("missing required settings: {missing}")]
    Configuration { missing: String },
    #[error("request failed: {detail}")]
    Transport { status: Option<u16>, detail: String },
    #[error("unexpected response shape: {detail}")]
    ResponseFormat { detail: String },
    #[error("invalid content: {detail}")]
    Content { detail: String },
}

impl OrchestrationError {
    pub fn configuration(missing: impl Into<String>) -> Self {
        Self::Configuration {
            missing: missing.into(),
        }
    }

    pub fn transport(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Transport {
            status,
            detail: detail.into(),
        }
    }

    pub fn response_format(detail: impl Into<String>) -> Self {
        Self::ResponseFormat {
            detail: detail.into(),
        }
    }

    pub fn content(detail: impl Into<String>) -> Self {
        Self::Content {
            detail: detail.into(),
        }
    }
}

impl From<reqwest::Error> for OrchestrationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            detail: err.to_string(),
        }
    }
}

/// Failure from the durable key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
