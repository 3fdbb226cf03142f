/// Errors that can occur during envelope encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x4352 \"CR\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// A complete frame arrived but its payload is not a valid envelope.
    ///
    /// Recoverable: the stream stays framed, so callers may skip the
    /// payload and keep reading.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl WireError {
    /// True when the frame boundary survived and reading may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WireError::Malformed(_))
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
