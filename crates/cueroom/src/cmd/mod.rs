use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Subcommand};
use cueroom_session::{RoomConfig, RoomId};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod host;
pub mod info;
pub mod join;
pub mod react;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a room and host it until interrupted.
    Host(HostArgs),
    /// Join an existing room and follow its state.
    Join(JoinArgs),
    /// Submit one mutation to a room and print the resulting state.
    Send(SendArgs),
    /// Send an ephemeral reaction to a room.
    React(ReactArgs),
    /// Probe a room without taking part in it.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Host(args) => host::run(args, format),
        Command::Join(args) => join::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::React(args) => react::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Room code to host. A fresh code is generated when omitted.
    pub room: Option<String>,
    /// Data directory for endpoints and snapshots.
    #[arg(long, env = "CUEROOM_DIR", value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Room code to join.
    pub room: String,
    /// Data directory for endpoints and snapshots.
    #[arg(long, env = "CUEROOM_DIR", value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Room code to send to.
    pub room: String,
    /// Mutation as JSON, e.g. '{"action":"SCORE","mode":"1vs1","id":1,"delta":1}'.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the mutation JSON from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Maximum time to wait for the host to confirm (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
    /// Data directory for endpoints and snapshots.
    #[arg(long, env = "CUEROOM_DIR", value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReactArgs {
    /// Room code to react in.
    pub room: String,
    /// Reaction token, typically an emoji.
    pub token: String,
    /// Data directory for endpoints and snapshots.
    #[arg(long, env = "CUEROOM_DIR", value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Room code to probe.
    pub room: String,
    /// Probe timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Data directory for endpoints and snapshots.
    #[arg(long, env = "CUEROOM_DIR", value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn room_config(dir: &Option<PathBuf>) -> RoomConfig {
    let root = dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("cueroom"));
    RoomConfig::at(root)
}

pub fn parse_room(input: &str) -> CliResult<RoomId> {
    RoomId::from_str(input)
        .map_err(|_| CliError::new(USAGE, format!("invalid room code: {input:?}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported timeout unit: {unit}"),
        )),
    }
}
