use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutorError {
    /// Upstream answered with a non-success status before any body was read.
    #[error("Connection error {status} {reason}: {body}")]
    Connection {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Stream read error: {0}")]
    StreamRead(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid {0} format received")]
    InvalidArtifact(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] std::env::VarError),
}

impl TutorError {
    /// Status code carried by a connection failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TutorError::Connection { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;
