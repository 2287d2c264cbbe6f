use thiserror::Error;

/// Errors produced by the wsx client stack.
#[derive(Debug, Error)]
pub enum WsxError {
    #[error("codec error: {0}")]
    Codec(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for WsxError {
    fn from(e: serde_json::Error) -> Self {
        WsxError::Codec(e.to_string())
    }
}

pub type WsxResult<T> = Result<T, WsxError>;
