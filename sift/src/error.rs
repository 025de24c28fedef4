//! Error types for search operations.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid filter clause '{clause}': {reason}")]
    Format { clause: String, reason: String },

    #[error("Invalid search row: {0}")]
    InvalidRecord(String),

    #[error("{0}")]
    Usage(String),

    #[error("{message}")]
    Transport { status: Option<u16>, message: String },
}

impl Error {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            status: None,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
