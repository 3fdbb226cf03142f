use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cueroom_session::Room;
use cueroom_state::Intent;

use crate::cmd::{parse_duration, parse_room, room_config, SendArgs};
use crate::exit::{session_error, CliError, CliResult, DATA_INVALID, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_state, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let id = parse_room(&args.room)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let intent = read_intent(&args)?;
    let config = room_config(&args.dir);

    let mut room =
        Room::open(id, &config).map_err(|err| session_error("failed to open room", err))?;

    let changes = Arc::new(AtomicUsize::new(0));
    {
        let changes = Arc::clone(&changes);
        room.on_change(move |_| {
            changes.fetch_add(1, Ordering::SeqCst);
        });
    }

    if room.is_host() {
        // Vacant room: apply directly against the canonical document.
        room.dispatch(intent);
    } else {
        // Wait for the seed snapshot, relay, then wait for the echo.
        wait_for(&mut room, &changes, 1, wait_timeout)
            .ok_or_else(|| CliError::new(TIMEOUT, "no snapshot received from host"))?;
        let base = changes.load(Ordering::SeqCst);
        room.dispatch(intent);
        wait_for(&mut room, &changes, base + 1, wait_timeout)
            .ok_or_else(|| CliError::new(TIMEOUT, "host did not confirm the mutation"))?;
    }

    print_state(room.state(), format);
    room.stop();
    Ok(SUCCESS)
}

fn read_intent(args: &SendArgs) -> CliResult<Intent> {
    let raw = match (&args.json, &args.file) {
        (Some(json), None) => json.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|err| CliError::new(USAGE, format!("cannot read {}: {err}", path.display())))?,
        _ => return Err(CliError::new(USAGE, "provide a mutation via --json or --file")),
    };

    serde_json::from_str(&raw)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid mutation: {err}")))
}

fn wait_for(
    room: &mut Room,
    changes: &Arc<AtomicUsize>,
    at_least: usize,
    timeout: Duration,
) -> Option<()> {
    let deadline = Instant::now() + timeout;
    while changes.load(Ordering::SeqCst) < at_least {
        if Instant::now() >= deadline {
            return None;
        }
        room.step(Duration::from_millis(50));
    }
    Some(())
}
