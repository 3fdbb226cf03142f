//! Unix domain socket transport for cueroom sessions.
//!
//! Room endpoints are claim-by-name: the deterministic socket path
//! derived from a room token doubles as the host's transport identity.
//! Claiming a name that is already live fails with an identity
//! collision, which is how host election resolves without a
//! coordinator.

pub mod error;
pub mod socket;
pub mod stream;

pub use error::{Result, TransportError};
pub use socket::RoomSocket;
pub use stream::RoomStream;
