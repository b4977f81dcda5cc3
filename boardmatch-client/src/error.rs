use boardmatch_core::SessionError;

/// Client and transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport is not connected")]
    NotConnected,

    #[error("player name cannot be empty")]
    InvalidPlayerName,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
