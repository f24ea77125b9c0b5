//! Agent error types

use rewrite_core::RewriteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
