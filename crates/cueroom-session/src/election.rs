use std::path::Path;

use cueroom_transport::{RoomSocket, RoomStream, TransportError};
use tracing::{debug, info};

/// Outcome of claiming a room's rendezvous name.
///
/// There is no coordinator. The first participant to bind the endpoint
/// becomes the host; everyone else observes the name as taken and
/// connects to the winner instead. A claim that fails for any other
/// reason leaves the participant offline but locally functional.
#[derive(Debug)]
pub enum Election {
    /// The claim succeeded. This participant is the host and owns the
    /// listening endpoint.
    Host(RoomSocket),
    /// The name was already held by a live host. This participant is a
    /// viewer, connected to the host.
    Viewer(RoomStream),
    /// The claim failed for a reason other than collision, or the host
    /// vanished between the collision and the follow-up connect.
    Offline(TransportError),
}

/// Run the election for the rendezvous endpoint at `path`.
pub fn elect(path: &Path) -> Election {
    match RoomSocket::claim(path) {
        Ok(socket) => {
            info!(path = %path.display(), "claimed rendezvous name, acting as host");
            Election::Host(socket)
        }
        Err(err) if err.is_identity_taken() => {
            // Expected collision, not a failure. Connect to the winner.
            match RoomSocket::connect(path) {
                Ok(stream) => {
                    info!(path = %path.display(), "name taken, joined as viewer");
                    Election::Viewer(stream)
                }
                Err(err) => {
                    debug!(%err, "host vanished between probe and connect");
                    Election::Offline(err)
                }
            }
        }
        Err(err) => Election::Offline(err),
    }
}
