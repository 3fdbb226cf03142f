use std::time::Duration;

use cueroom_session::Room;

use crate::cmd::{parse_room, room_config, ReactArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_reaction, OutputFormat};

pub fn run(args: ReactArgs, format: OutputFormat) -> CliResult<i32> {
    let id = parse_room(&args.room)?;
    let config = room_config(&args.dir);

    let mut room =
        Room::open(id, &config).map_err(|err| session_error("failed to open room", err))?;

    room.on_reaction(move |reaction| print_reaction(reaction, format));

    room.emit(args.token);
    // One short drive so any relayed traffic settles before teardown.
    room.step(Duration::from_millis(100));
    room.stop();

    Ok(SUCCESS)
}
