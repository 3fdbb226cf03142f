use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;

/// Maximum rotation roster size.
pub const MAX_ROTATION_PLAYERS: usize = 5;
/// Minimum rotation roster size.
pub const MIN_ROTATION_PLAYERS: usize = 2;
/// Number of distinct player color slots consumers can render.
pub const PLAYER_COLOR_COUNT: u32 = 8;
/// Default shot clock duration in seconds.
pub const DEFAULT_SHOT_SECONDS: u32 = 30;
/// Default race-to target for heads-up play.
pub const DEFAULT_RACE_TO: i64 = 7;

/// The two supported table formats.
///
/// Serialized names match the historical wire format so old snapshots
/// keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Two fixed players racing to a target score.
    #[serde(rename = "1vs1")]
    HeadsUp,
    /// Open table with 2-5 players and zero-sum scoring.
    #[serde(rename = "den")]
    Rotation,
}

/// How the table bill splits between heads-up players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    /// Loser pays 70%, winner 30%.
    #[serde(rename = "73")]
    SeventyThirty,
    /// Even split.
    #[serde(rename = "equal")]
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u64,
    pub name: String,
    pub score: i64,
    /// Personal surcharge the billing consumer folds into totals.
    pub personal: i64,
    pub color_idx: u32,
}

impl Player {
    pub fn new(id: u64, name: impl Into<String>, color_idx: u32) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
            personal: 0,
            color_idx,
        }
    }
}

/// Shot clock sub-state. Only the host ever ticks it; viewers observe
/// ticks as full state replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotClock {
    pub seconds: u32,
    pub initial_seconds: u32,
    pub running: bool,
}

impl Default for ShotClock {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_SHOT_SECONDS,
            initial_seconds: DEFAULT_SHOT_SECONDS,
            running: false,
        }
    }
}

/// The single canonical mutable document of a room.
///
/// Exactly one copy is authoritative at any instant (the host's); every
/// other copy is a replica that is fully replaced, never merged, on each
/// state broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub game_mode: GameMode,
    pub race_to: i64,
    pub unit_price: i64,
    pub table_bill: i64,
    pub split_mode: SplitMode,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(rename = "players1vs1")]
    pub heads_up: Vec<Player>,
    #[serde(rename = "playersDen")]
    pub rotation: Vec<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_player_id: Option<u64>,
    #[serde(default)]
    pub shot_clock: ShotClock,
}

impl SessionState {
    /// The default document a fresh room starts from.
    pub fn template() -> Self {
        Self {
            game_mode: GameMode::HeadsUp,
            race_to: DEFAULT_RACE_TO,
            unit_price: 10_000,
            table_bill: 0,
            split_mode: SplitMode::SeventyThirty,
            history: Vec::new(),
            heads_up: vec![Player::new(1, "PLAYER 01", 0), Player::new(2, "PLAYER 02", 1)],
            rotation: vec![
                Player::new(1, "PLAYER A", 0),
                Player::new(2, "PLAYER B", 1),
                Player::new(3, "PLAYER C", 2),
            ],
            break_player_id: None,
            shot_clock: ShotClock::default(),
        }
    }

    /// Roster addressed by a mutation intent.
    pub fn roster(&self, mode: GameMode) -> &[Player] {
        match mode {
            GameMode::HeadsUp => &self.heads_up,
            GameMode::Rotation => &self.rotation,
        }
    }

    pub fn roster_mut(&mut self, mode: GameMode) -> &mut Vec<Player> {
        match mode {
            GameMode::HeadsUp => &mut self.heads_up,
            GameMode::Rotation => &mut self.rotation,
        }
    }

    /// The latched winner, derived from scores rather than stored.
    ///
    /// Latches in heads-up mode once a score reaches `race_to` and clears
    /// on its own when a corrective delta drops the score back under the
    /// target. Deriving it keeps the latch consistent across reloads.
    pub fn latched_winner(&self) -> Option<&Player> {
        if self.game_mode != GameMode::HeadsUp || self.race_to <= 0 {
            return None;
        }
        self.heads_up.iter().find(|p| p.score >= self.race_to)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::template()
    }
}
