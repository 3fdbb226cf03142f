use std::sync::atomic::Ordering;

use cueroom_session::{Room, RoomId};

use crate::cmd::{parse_room, room_config, HostArgs};
use crate::exit::{
    session_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, TRANSPORT_ERROR,
};
use crate::output::{print_reaction, print_state, OutputFormat};

pub fn run(args: HostArgs, format: OutputFormat) -> CliResult<i32> {
    let id = match &args.room {
        Some(room) => parse_room(room)?,
        None => RoomId::generate(),
    };
    let config = room_config(&args.dir);

    let mut room =
        Room::open(id, &config).map_err(|err| session_error("failed to open room", err))?;

    if let Some(err) = room.transport_error() {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!("room endpoint unavailable: {err}"),
        ));
    }
    if !room.is_host() {
        room.stop();
        return Err(CliError::new(
            FAILURE,
            "room is already hosted; use `cueroom join`",
        ));
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

pub(crate) fn install_ctrlc_handler(room: &Room) -> CliResult<()> {
    let flag = room.shutdown_flag();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
