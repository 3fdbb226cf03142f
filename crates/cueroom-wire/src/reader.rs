use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use cueroom_transport::RoomStream;

use crate::codec::{decode_frame, DEFAULT_MAX_PAYLOAD};
use crate::envelope::Envelope;
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete envelopes from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete
/// frames. A malformed payload surfaces as a recoverable error; the
/// frame boundary survives and the caller may keep reading.
pub struct EnvelopeReader<T> {
    inner: T,
    buf: BytesMut,
    max_payload: usize,
}

impl<T: Read> EnvelopeReader<T> {
    /// Create a new envelope reader with the default payload cap.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Read the next complete frame payload (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached.
    pub fn read_payload(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = decode_frame(&mut self.buf, self.max_payload)? {
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(WireError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read and decode the next envelope (blocking).
    pub fn recv(&mut self) -> Result<Envelope> {
        let payload = self.read_payload()?;
        Envelope::from_payload(payload.as_ref())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl EnvelopeReader<RoomStream> {
    /// Create a reader for a `RoomStream`, applying a read timeout.
    pub fn with_timeout(
        inner: RoomStream,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        inner
            .set_read_timeout(timeout)
            .map_err(transport_to_wire_error)?;
        Ok(Self::new(inner))
    }
}

fn transport_to_wire_error(err: cueroom_transport::TransportError) -> WireError {
    match err {
        cueroom_transport::TransportError::Io(io)
        | cueroom_transport::TransportError::Accept(io) => WireError::Io(io),
        cueroom_transport::TransportError::Bind { source, .. }
        | cueroom_transport::TransportError::Connect { source, .. } => WireError::Io(source),
        other => WireError::Io(std::io::Error::other(other.to_string())),
    }
}
