//! Room sessions: host election, replication and relay.
//!
//! A room is identified by a shareable code. The first participant to
//! claim the code's rendezvous endpoint becomes the host and owns the
//! canonical session document; everyone else becomes a viewer holding
//! a replica. Viewers relay mutations upstream as commands, the host
//! applies them and broadcasts full snapshots back down. Reactions
//! ride the same connections but bypass the document entirely.

pub mod election;
pub mod error;
mod executor;
pub mod room;
pub mod room_id;
pub mod store;

pub use election::{elect, Election};
pub use error::{Result, SessionError};
pub use room::{Role, Room, RoomConfig};
pub use room_id::{RoomId, ROOM_ID_LEN};
pub use store::SnapshotStore;
