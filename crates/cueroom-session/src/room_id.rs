use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;

use crate::error::SessionError;

/// Length of a shareable room code.
pub const ROOM_ID_LEN: usize = 6;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A shareable room code.
///
/// Six uppercase alphanumerics, e.g. `K7Q2ZD`. The code doubles as the
/// rendezvous name: every participant derives the same endpoint path
/// from it, which is what makes leaderless host election possible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Generate a fresh random room code.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..ROOM_ID_LEN)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The rendezvous endpoint path for this room under `dir`.
    pub fn socket_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("cueroom-{}.sock", self.0))
    }

    /// The snapshot file name for this room.
    pub fn snapshot_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = SessionError;

    /// Parse a room code. Case-insensitive on input; codes are stored
    /// and displayed uppercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != ROOM_ID_LEN
            || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(SessionError::InvalidRoomId(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }
}
