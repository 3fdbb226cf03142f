use cueroom_session::Room;
use tracing::info;

use crate::cmd::host::install_ctrlc_handler;
use crate::cmd::{parse_room, room_config, JoinArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_reaction, print_state, OutputFormat};

pub fn run(args: JoinArgs, format: OutputFormat) -> CliResult<i32> {
    let id = parse_room(&args.room)?;
    let config = room_config(&args.dir);

    let mut room =
        Room::open(id, &config).map_err(|err| session_error("failed to open room", err))?;

    if let Some(err) = room.transport_error() {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!("room endpoint unavailable: {err}"),
        ));
    }

    // Joining a vacant room wins the election; the caller simply ends
    // up hosting instead of following.
    if room.is_host() {
        info!(room = %room.id(), "room was vacant, hosting it");
    }

    println!("room {}", room.id());
    print_state(room.state(), format);

    room.on_change(move |state| print_state(state, format));
    room.on_reaction(move |reaction| print_reaction(reaction, format));

    install_ctrlc_handler(&room)?;
    room.run();
    room.stop();

    Ok(SUCCESS)
}
