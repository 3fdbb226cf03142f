use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use cueroom_state::{GameMode, SessionState};
use cueroom_wire::Reaction;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn mode_name(mode: GameMode) -> &'static str {
    match mode {
        GameMode::HeadsUp => "1vs1",
        GameMode::Rotation => "den",
    }
}

pub fn print_state(state: &SessionState, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PLAYER", "SCORE", "PERSONAL"]);
            for player in state.roster(state.game_mode) {
                table.add_row(vec![
                    player.name.clone(),
                    player.score.to_string(),
                    player.personal.to_string(),
                ]);
            }
            println!(
                "mode={} raceTo={} clock={}{}",
                mode_name(state.game_mode),
                state.race_to,
                state.shot_clock.seconds,
                if state.shot_clock.running { " (running)" } else { "" }
            );
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "mode={} raceTo={} clock={} running={}",
                mode_name(state.game_mode),
                state.race_to,
                state.shot_clock.seconds,
                state.shot_clock.running
            );
            for player in state.roster(state.game_mode) {
                println!("  {}  {}", player.name, player.score);
            }
        }
    }
}

#[derive(Serialize)]
struct ReactionOutput<'a> {
    token: &'a str,
    id: u64,
}

pub fn print_reaction(reaction: &Reaction, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReactionOutput {
                token: &reaction.token,
                id: reaction.id,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("reaction {}", reaction.token);
        }
    }
}
