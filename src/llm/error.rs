use thiserror::Error;

/// Failure of the completion backend: transport, auth, quota or a malformed reply.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompletionError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

impl CompletionError {
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        CompletionError::Transport(err.to_string())
    }
}
