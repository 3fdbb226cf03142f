/// Reasons a mutation intent is refused by the engine.
///
/// Rejections are absorbed by the session layer and never propagate to
/// the sender; the protocol has no acknowledgement channel, so the only
/// confirmation of effect is the next state broadcast.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The intent names a player id not present in the roster.
    #[error("unknown player id {0}")]
    UnknownPlayer(u64),

    /// A winner is latched; score-increasing intents are refused until a
    /// corrective negative delta clears the condition.
    #[error("winning condition latched; score increase refused")]
    WinnerLatched,

    /// The rotation roster is already at its maximum size.
    #[error("roster is full ({0} players max)")]
    RosterFull(usize),

    /// The rotation roster may not shrink below its minimum size.
    #[error("roster is at minimum size ({0} players)")]
    RosterAtMinimum(usize),

    /// The operation does not apply to the current game mode.
    #[error("operation does not apply to the current game mode")]
    WrongMode,

    /// A reorder intent referenced a position outside the roster.
    #[error("player index {0} out of range")]
    IndexOutOfRange(usize),

    /// A configuration value is outside its accepted range.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, Rejection>;
