use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("user {user_id} has ground truth but no recommendation entry")]
    MissingGroundTruth { user_id: u32 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl EvalError {
    pub fn invalid(message: impl Into<String>) -> Self {
        EvalError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
