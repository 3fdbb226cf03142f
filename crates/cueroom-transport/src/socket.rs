use std::io::ErrorKind;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::RoomStream;

/// A claimed room endpoint.
///
/// Claiming a room name is the host-election primitive: endpoint names
/// are globally unique per runtime directory, so the first claimant
/// becomes the host and every later claimant learns about the collision
/// and connects as a viewer instead. The socket file is removed on drop
/// when its inode identity still matches the one we created.
#[derive(Debug)]
pub struct RoomSocket {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl RoomSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Attempt to claim a room endpoint name.
    ///
    /// Succeeds when the name is free or only a stale socket file is in
    /// the way (previous host gone without cleanup). Fails with
    /// [`TransportError::IdentityTaken`] when a live listener already
    /// holds the name, the expected collision signal during election.
    pub fn claim(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| TransportError::Bind {
                path: path.clone(),
                source: e,
            })?;
            if !metadata.file_type().is_socket() {
                return Err(TransportError::Bind {
                    path: path.clone(),
                    source: std::io::Error::new(
                        ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                });
            }

            // Probe for a live listener. A refused probe means the previous
            // holder died without cleanup; anything accepting is a live host.
            match UnixStream::connect(&path) {
                Ok(_probe) => {
                    debug!(?path, "endpoint name held by live listener");
                    return Err(TransportError::IdentityTaken { path });
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::ConnectionRefused | ErrorKind::NotFound
                    ) =>
                {
                    debug!(?path, "removing stale socket");
                    std::fs::remove_file(&path).map_err(|e| TransportError::Bind {
                        path: path.clone(),
                        source: e,
                    })?;
                }
                Err(err) => {
                    return Err(TransportError::Bind {
                        path: path.clone(),
                        source: err,
                    });
                }
            }
        }

        let listener = match UnixListener::bind(&path) {
            Ok(listener) => listener,
            // Lost a bind race against another claimant: same collision outcome.
            Err(err) if err.kind() == ErrorKind::AddrInUse => {
                return Err(TransportError::IdentityTaken { path });
            }
            Err(err) => {
                return Err(TransportError::Bind { path, source: err });
            }
        };

        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(|e| TransportError::Bind {
            path: path.clone(),
            source: e,
        })?;
        let created_metadata =
            std::fs::symlink_metadata(&path).map_err(|e| TransportError::Bind {
                path: path.clone(),
                source: e,
            })?;
        let created_inode = Some((created_metadata.dev(), created_metadata.ino()));

        info!(?path, "claimed room endpoint");

        Ok(Self {
            listener,
            path,
            created_inode,
        })
    }

    /// Accept an incoming viewer connection (blocking).
    pub fn accept(&self) -> Result<RoomStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!("accepted connection");
        Ok(RoomStream::from_unix(stream))
    }

    /// Connect to a claimed room endpoint (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<RoomStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to room endpoint");
        Ok(RoomStream::from_unix(stream))
    }

    /// The path this endpoint is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RoomSocket {
    fn drop(&mut self) {
        if let Some((expected_dev, expected_ino)) = self.created_inode {
            if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                if metadata.file_type().is_socket()
                    && metadata.dev() == expected_dev
                    && metadata.ino() == expected_ino
                {
                    debug!(path = ?self.path, "cleaning up socket file");
                    let _ = std::fs::remove_file(&self.path);
                } else {
                    debug!(
                        path = ?self.path,
                        "socket path identity changed; skipping cleanup"
                    );
                }
            }
        }
    }
}
