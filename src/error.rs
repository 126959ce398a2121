use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamelistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error in {path}: {message}")]
    Config { path: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("Render error: {0}")]
    Render(#[from] std::fmt::Error),
}

/// Problems with the `[start, end]` line window.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Line numbers start at 1, got start line {start}")]
    ZeroStart { start: usize },

    #[error("Start line {start} is after end line {end}")]
    Inverted { start: usize, end: usize },
}

pub type Result<T> = std::result::Result<T, SamelistError>;
