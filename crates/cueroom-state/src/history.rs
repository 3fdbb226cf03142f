use serde::{Deserialize, Serialize};

use crate::model::{GameMode, SessionState};

/// Bounded history length; inserting past the cap evicts the oldest.
pub const HISTORY_CAP: usize = 100;

/// Consumer-facing classification of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Score,
    Balance,
    System,
    Info,
}

/// Compact per-player score line captured alongside rotation entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub n: String,
    pub s: i64,
}

/// Score snapshot taken after the change an entry records.
///
/// Heads-up snapshots are a single formatted line; rotation snapshots
/// keep one line per player. Untagged so both shapes deserialize from
/// the historical format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreSnapshot {
    Text(String),
    Table(Vec<ScoreLine>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Millisecond timestamp doubling as a client-side key.
    pub id: u64,
    /// Wall-clock "HH:MM" the entry was recorded at.
    pub time: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub snapshot: ScoreSnapshot,
}

/// Record an entry at the front of the log, evicting past the cap.
pub fn record(state: &mut SessionState, text: impl Into<String>, kind: HistoryKind, now_ms: u64) {
    let snapshot = snapshot_scores(state);
    let entry = HistoryEntry {
        id: now_ms,
        time: clock_time(now_ms),
        text: text.into(),
        kind,
        snapshot,
    };
    state.history.insert(0, entry);
    state.history.truncate(HISTORY_CAP);
}

fn snapshot_scores(state: &SessionState) -> ScoreSnapshot {
    match state.game_mode {
        GameMode::HeadsUp => {
            let line = state
                .heads_up
                .iter()
                .map(|p| format!("{}: {}", p.name, p.score))
                .collect::<Vec<_>>()
                .join(" - ");
            ScoreSnapshot::Text(line)
        }
        GameMode::Rotation => ScoreSnapshot::Table(
            state
                .rotation
                .iter()
                .map(|p| ScoreLine {
                    n: p.name.clone(),
                    s: p.score,
                })
                .collect(),
        ),
    }
}

/// "HH:MM" (UTC) for a millisecond timestamp.
pub fn clock_time(now_ms: u64) -> String {
    let secs = now_ms / 1000;
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    format!("{hours:02}:{minutes:02}")
}
