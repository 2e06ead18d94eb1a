//! Error types.

use thiserror::Error;

/// Configuration contract violations. Raised at construction time only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a finite value in [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f32 },
    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a detector call produced no batch. Never fatal to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
    #[error("detector did not answer within {0} ms")]
    Timeout(u64),
    #[error("detector is still busy with a previous frame")]
    Busy,
    #[error("detector worker has shut down")]
    Disconnected,
    #[error("detector failed: {0}")]
    Backend(String),
}

/// The refined detector's reply could not be understood.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("reply contains no JSON object")]
    NoJson,
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
