use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;

use crate::error::Result;

/// A connected room stream implementing Read + Write.
///
/// Wraps a Unix domain socket stream. Clones share the underlying
/// descriptor, which lets one half live in a reader thread while the
/// session keeps a write half and a shutdown handle.
pub struct RoomStream {
    inner: UnixStream,
}

impl Read for RoomStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for RoomStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl RoomStream {
    pub(crate) fn from_unix(stream: UnixStream) -> Self {
        Self { inner: stream }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_unix(cloned))
    }

    /// Shut down both halves of the connection.
    ///
    /// Unblocks any thread sitting in a blocking read on a clone of this
    /// stream. Errors for already-closed streams are ignored by callers
    /// during teardown.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }
}

impl std::fmt::Debug for RoomStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomStream").field("type", &"unix").finish()
    }
}
