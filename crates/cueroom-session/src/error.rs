use thiserror::Error;

/// Session-level errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error")]
    Transport(#[from] cueroom_transport::TransportError),

    #[error("wire error")]
    Wire(#[from] cueroom_wire::WireError),

    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),

    #[error("snapshot serialization failed")]
    Snapshot(#[from] serde_json::Error),

    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
