use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use cueroom_transport::RoomStream;

use crate::codec::{encode_frame, DEFAULT_MAX_PAYLOAD};
use crate::envelope::Envelope;
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete envelopes to any `Write` stream.
pub struct EnvelopeWriter<T> {
    inner: T,
    buf: BytesMut,
    max_payload: usize,
}

impl<T: Write> EnvelopeWriter<T> {
    /// Create a new envelope writer with the default payload cap.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Encode and send an envelope (blocking).
    pub fn send(&mut self, envelope: &Envelope) -> Result<()> {
        let payload = envelope.to_payload()?;
        self.send_payload(&payload)
    }

    /// Send a pre-encoded payload (blocking).
    ///
    /// Used by the host's reaction relay, which forwards payloads
    /// verbatim without re-encoding.
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.max_payload {
            return Err(WireError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload,
            });
        }

        self.buf.clear();
        encode_frame(payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl EnvelopeWriter<RoomStream> {
    /// Create a writer for a `RoomStream`, applying a write timeout.
    pub fn with_timeout(
        inner: RoomStream,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        inner
            .set_write_timeout(timeout)
            .map_err(|err| match err {
                cueroom_transport::TransportError::Io(io) => WireError::Io(io),
                other => WireError::Io(std::io::Error::other(other.to_string())),
            })?;
        Ok(Self::new(inner))
    }
}
