use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cueroom_state::SessionState;
use tracing::{debug, warn};

use crate::error::Result;
use crate::room_id::RoomId;

/// Durable per-room snapshots.
///
/// One JSON file per room, replaced atomically on every accepted
/// mutation. Snapshots only ever matter at startup: a host seeds its
/// canonical document from the latest one, a viewer keeps one around
/// so it can show something if it later reopens the room alone.
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open a store rooted at `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, room: &RoomId) -> PathBuf {
        self.dir.join(room.snapshot_name())
    }

    /// Load the latest snapshot for `room`.
    ///
    /// Returns `None` when no snapshot exists or the file fails to
    /// parse. A corrupt snapshot is logged and treated as absent; the
    /// caller falls back to the template document.
    pub fn load(&self, room: &RoomId) -> Option<SessionState> {
        let path = self.path_for(room);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), %err, "snapshot unreadable");
                }
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => {
                debug!(path = %path.display(), "snapshot loaded");
                Some(state)
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "corrupt snapshot ignored");
                None
            }
        }
    }

    /// Persist a snapshot for `room`, replacing any previous one.
    ///
    /// Written to a temp file first and renamed into place, so readers
    /// never observe a half-written snapshot.
    pub fn save(&self, room: &RoomId, state: &SessionState) -> Result<()> {
        let path = self.path_for(room);
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec(state)?;
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    /// Remove the snapshot for `room`, if present.
    pub fn remove(&self, room: &RoomId) -> Result<()> {
        match std::fs::remove_file(self.path_for(room)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// The directory snapshots live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
