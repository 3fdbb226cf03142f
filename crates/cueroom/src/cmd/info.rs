use std::io::ErrorKind;

use cueroom_session::SnapshotStore;
use cueroom_state::SessionState;
use cueroom_transport::{RoomSocket, TransportError};
use cueroom_wire::{Envelope, EnvelopeReader};
use serde::Serialize;

use crate::cmd::{parse_duration, parse_room, room_config, InfoArgs};
use crate::exit::{session_error, transport_error, wire_error, CliResult, SUCCESS};
use crate::output::{print_state, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    room: String,
    hosted: bool,
    has_snapshot: bool,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let id = parse_room(&args.room)?;
    let timeout = parse_duration(&args.timeout)?;
    let config = room_config(&args.dir);
    let path = id.socket_path(&config.runtime_dir);

    let store = SnapshotStore::open(&config.state_dir)
        .map_err(|err| session_error("cannot open snapshot store", err))?;
    let snapshot = store.load(&id);

    // Connecting observes the room without claiming its name.
    let live_state = match RoomSocket::connect(&path) {
        Ok(stream) => {
            let mut reader = EnvelopeReader::with_timeout(stream, Some(timeout))
                .map_err(|err| wire_error("probe setup failed", err))?;
            // The host seeds every connection with its document first.
            loop {
                match reader.recv() {
                    Ok(Envelope::State(state)) => break Some(state),
                    Ok(_) => continue,
                    Err(err) => return Err(wire_error("probe read failed", err)),
                }
            }
        }
        Err(TransportError::Connect { ref source, .. })
            if matches!(
                source.kind(),
                ErrorKind::NotFound | ErrorKind::ConnectionRefused
            ) =>
        {
            None
        }
        Err(err) => return Err(transport_error("probe failed", err)),
    };

    let out = InfoOutput {
        room: id.to_string(),
        hosted: live_state.is_some(),
        has_snapshot: snapshot.is_some(),
    };
    let state: Option<&SessionState> = live_state.as_ref().or(snapshot.as_ref());

    print_info(&out, state, format);
    Ok(SUCCESS)
}

fn print_info(out: &InfoOutput, state: Option<&SessionState>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
            if let Some(state) = state {
                print_state(state, format);
            }
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("room: {}", out.room);
            println!("hosted: {}", out.hosted);
            println!("snapshot: {}", out.has_snapshot);
            if let Some(state) = state {
                print_state(state, format);
            }
        }
    }
}
