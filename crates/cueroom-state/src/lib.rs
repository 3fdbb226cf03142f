//! The replicated scoreboard document and its mutation engine.
//!
//! Replication is whole-snapshot: the host owns the canonical
//! [`SessionState`] and every update fully replaces each replica, so
//! the document needs no merge or conflict logic. The engine is the
//! only code that mutates the document; viewers never call it.

pub mod engine;
pub mod error;
pub mod history;
pub mod intent;
pub mod model;

pub use engine::apply;
pub use error::Rejection;
pub use history::{HistoryEntry, HistoryKind, ScoreSnapshot, HISTORY_CAP};
pub use intent::{ClockAction, Intent, MoveDirection};
pub use model::{
    GameMode, Player, SessionState, ShotClock, SplitMode, MAX_ROTATION_PLAYERS,
    MIN_ROTATION_PLAYERS,
};
