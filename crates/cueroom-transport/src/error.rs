use std::path::PathBuf;

/// Errors that can occur in room transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint name is already claimed by a live listener.
    ///
    /// This is the expected collision outcome of a host election: the
    /// caller should demote itself to a viewer and connect instead.
    #[error("endpoint identity already taken: {path}")]
    IdentityTaken { path: PathBuf },

    /// Failed to bind to the specified address.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

impl TransportError {
    /// True when the failure is the expected identity-collision outcome
    /// of an election rather than a genuine transport fault.
    pub fn is_identity_taken(&self) -> bool {
        matches!(self, TransportError::IdentityTaken { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
