use serde::{Deserialize, Serialize};

use crate::model::GameMode;

/// Direction for roster reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    pub fn offset(self) -> isize {
        match self {
            MoveDirection::Up => -1,
            MoveDirection::Down => 1,
        }
    }
}

/// Shot clock directives carried inside a clock intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockAction {
    #[serde(rename = "START")]
    Start,
    #[serde(rename = "STOP")]
    Stop,
    #[serde(rename = "RESET")]
    Reset,
    #[serde(rename = "EXT")]
    Extend,
    #[serde(rename = "SET_TIME")]
    SetDuration,
}

/// A requested mutation of the session document.
///
/// This is the COMMAND payload: viewers serialize an intent upstream,
/// the host executes the identical value directly. Intents are
/// idempotent single-step deltas, which is what makes the lossy
/// single-slot relay mailbox acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Intent {
    #[serde(rename = "SCORE")]
    Score { mode: GameMode, id: u64, delta: i64 },
    #[serde(rename = "RENAME")]
    Rename {
        mode: GameMode,
        id: u64,
        name: String,
    },
    #[serde(rename = "ADD_PLAYER")]
    AddPlayer,
    #[serde(rename = "REMOVE_PLAYER")]
    RemovePlayer { id: u64 },
    #[serde(rename = "MOVE_PLAYER")]
    MovePlayer {
        index: usize,
        direction: MoveDirection,
    },
    #[serde(rename = "REBALANCE")]
    Rebalance { id: u64 },
    #[serde(rename = "TOGGLE_BREAK")]
    ToggleBreak,
    #[serde(rename = "SET_MODE")]
    SetMode { mode: GameMode },
    #[serde(rename = "SET_RACE_TO")]
    SetRaceTo { value: i64 },
    #[serde(rename = "CLOCK")]
    Clock {
        #[serde(rename = "clockAction")]
        action: ClockAction,
        #[serde(rename = "clockValue", skip_serializing_if = "Option::is_none")]
        value: Option<u32>,
    },
    #[serde(rename = "RESET")]
    Reset,
}
