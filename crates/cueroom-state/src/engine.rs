//! The mutation engine.
//!
//! Maps intents onto the session document. Pure with respect to I/O:
//! callers supply the wall-clock timestamp, making every mutation
//! deterministic under test. Only the host-side executor ever calls
//! [`apply`]; viewers relay intents instead.

use tracing::debug;

use crate::error::{Rejection, Result};
use crate::history::{record, HistoryKind};
use crate::intent::{ClockAction, Intent};
use crate::model::{
    GameMode, Player, SessionState, MAX_ROTATION_PLAYERS, MIN_ROTATION_PLAYERS,
    PLAYER_COLOR_COUNT,
};

/// Apply a mutation intent to the canonical document.
///
/// On success the document has been mutated in place and, where the
/// original behavior demands it, a history entry recorded. A rejection
/// leaves the document untouched.
pub fn apply(state: &mut SessionState, intent: &Intent, now_ms: u64) -> Result<()> {
    match intent {
        Intent::Score { mode, id, delta } => score(state, *mode, *id, *delta, now_ms),
        Intent::Rename { mode, id, name } => rename(state, *mode, *id, name),
        Intent::AddPlayer => add_player(state, now_ms),
        Intent::RemovePlayer { id } => remove_player(state, *id, now_ms),
        Intent::MovePlayer { index, direction } => {
            move_player(state, *index, direction.offset())
        }
        Intent::Rebalance { id } => rebalance(state, *id, now_ms),
        Intent::ToggleBreak => toggle_break(state),
        Intent::SetMode { mode } => {
            state.game_mode = *mode;
            Ok(())
        }
        Intent::SetRaceTo { value } => set_race_to(state, *value),
        Intent::Clock { action, value } => clock(state, *action, *value),
        Intent::Reset => {
            reset(state, now_ms);
            Ok(())
        }
    }
}

fn score(state: &mut SessionState, mode: GameMode, id: u64, delta: i64, now_ms: u64) -> Result<()> {
    if delta > 0 && state.latched_winner().is_some() {
        debug!(id, delta, "score increase refused: winner latched");
        return Err(Rejection::WinnerLatched);
    }

    let clamp_at_zero = mode == GameMode::HeadsUp;
    let player = state
        .roster_mut(mode)
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(Rejection::UnknownPlayer(id))?;

    let old = player.score;
    // Deltas arrive off the wire; saturate instead of trusting them.
    let new = if clamp_at_zero {
        old.saturating_add(delta).max(0)
    } else {
        old.saturating_add(delta)
    };
    player.score = new;
    let name = player.name.clone();

    // Mosconi rule: a made ball rearms the shot clock.
    if delta > 0 {
        state.shot_clock.seconds = state.shot_clock.initial_seconds;
        state.shot_clock.running = false;
    }

    let change = if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    };
    record(
        state,
        format!("{name}: {change} ({old} -> {new})"),
        HistoryKind::Score,
        now_ms,
    );
    Ok(())
}

fn rename(state: &mut SessionState, mode: GameMode, id: u64, name: &str) -> Result<()> {
    let player = state
        .roster_mut(mode)
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(Rejection::UnknownPlayer(id))?;
    player.name = name.to_string();
    Ok(())
}

fn add_player(state: &mut SessionState, now_ms: u64) -> Result<()> {
    let count = state.rotation.len();
    if count >= MAX_ROTATION_PLAYERS {
        return Err(Rejection::RosterFull(MAX_ROTATION_PLAYERS));
    }

    // Names run PLAYER A, B, C... following roster position.
    let letter = (b'A' + count as u8) as char;
    let name = format!("PLAYER {letter}");
    let color_idx = count as u32 % PLAYER_COLOR_COUNT;
    state.rotation.push(Player::new(now_ms, name.clone(), color_idx));

    record(
        state,
        format!("Player added: {name}"),
        HistoryKind::System,
        now_ms,
    );
    Ok(())
}

fn remove_player(state: &mut SessionState, id: u64, now_ms: u64) -> Result<()> {
    if state.rotation.len() <= MIN_ROTATION_PLAYERS {
        return Err(Rejection::RosterAtMinimum(MIN_ROTATION_PLAYERS));
    }
    let position = state
        .rotation
        .iter()
        .position(|p| p.id == id)
        .ok_or(Rejection::UnknownPlayer(id))?;
    let removed = state.rotation.remove(position);

    record(
        state,
        format!("Player removed: {}", removed.name),
        HistoryKind::System,
        now_ms,
    );
    Ok(())
}

fn move_player(state: &mut SessionState, index: usize, offset: isize) -> Result<()> {
    let len = state.rotation.len();
    if index >= len {
        return Err(Rejection::IndexOutOfRange(index));
    }
    let target = index as isize + offset;
    if target < 0 || target as usize >= len {
        return Err(Rejection::IndexOutOfRange(index));
    }
    state.rotation.swap(index, target as usize);
    Ok(())
}

fn rebalance(state: &mut SessionState, id: u64, now_ms: u64) -> Result<()> {
    if !state.rotation.iter().any(|p| p.id == id) {
        return Err(Rejection::UnknownPlayer(id));
    }
    // Zero-sum balance: the target absorbs the negated sum of the rest.
    let others: i64 = state
        .rotation
        .iter()
        .filter(|p| p.id != id)
        .map(|p| p.score)
        .fold(0i64, i64::saturating_add);

    let player = state
        .rotation
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(Rejection::UnknownPlayer(id))?;
    let old = player.score;
    player.score = others.saturating_neg();
    let name = player.name.clone();
    let new = player.score;

    record(
        state,
        format!("Balanced: {name} ({old} -> {new})"),
        HistoryKind::Balance,
        now_ms,
    );
    Ok(())
}

fn toggle_break(state: &mut SessionState) -> Result<()> {
    if state.game_mode != GameMode::HeadsUp || state.heads_up.len() < 2 {
        return Err(Rejection::WrongMode);
    }
    let first = state.heads_up[0].id;
    let second = state.heads_up[1].id;
    // With no holder set, the first player takes the break.
    state.break_player_id = Some(if state.break_player_id == Some(first) {
        second
    } else {
        first
    });
    Ok(())
}

fn set_race_to(state: &mut SessionState, value: i64) -> Result<()> {
    if value < 0 {
        return Err(Rejection::InvalidValue(format!(
            "race target must be non-negative, got {value}"
        )));
    }
    state.race_to = value;
    Ok(())
}

fn clock(state: &mut SessionState, action: ClockAction, value: Option<u32>) -> Result<()> {
    let clock = &mut state.shot_clock;
    match action {
        ClockAction::Start => {
            if clock.seconds == 0 {
                clock.seconds = clock.initial_seconds;
            }
            clock.running = true;
        }
        ClockAction::Stop => clock.running = false,
        ClockAction::Reset => {
            clock.seconds = clock.initial_seconds;
            clock.running = false;
        }
        ClockAction::Extend => {
            clock.seconds = clock.seconds.saturating_add(clock.initial_seconds);
        }
        ClockAction::SetDuration => {
            let value = value.ok_or_else(|| {
                Rejection::InvalidValue("clock duration requires a value".to_string())
            })?;
            if value == 0 {
                return Err(Rejection::InvalidValue(
                    "clock duration must be positive".to_string(),
                ));
            }
            clock.initial_seconds = value;
            clock.seconds = value;
        }
    }
    Ok(())
}

fn reset(state: &mut SessionState, now_ms: u64) {
    // Fresh match preserving identity and table settings.
    let mut next = SessionState::template();
    next.game_mode = state.game_mode;
    next.race_to = state.race_to;
    next.unit_price = state.unit_price;
    next.split_mode = state.split_mode;
    next.heads_up = state
        .heads_up
        .iter()
        .map(|p| Player {
            score: 0,
            ..p.clone()
        })
        .collect();
    next.rotation = state
        .rotation
        .iter()
        .map(|p| Player {
            score: 0,
            ..p.clone()
        })
        .collect();
    next.shot_clock.initial_seconds = state.shot_clock.initial_seconds;
    next.shot_clock.seconds = state.shot_clock.initial_seconds;
    *state = next;

    record(state, "New match started", HistoryKind::System, now_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::MoveDirection;

    fn heads_up_state(p1: i64, p2: i64, race_to: i64) -> SessionState {
        let mut state = SessionState::template();
        state.race_to = race_to;
        state.heads_up[0].score = p1;
        state.heads_up[1].score = p2;
        state
    }

    fn score(mode: GameMode, id: u64, delta: i64) -> Intent {
        Intent::Score { mode, id, delta }
    }

    #[test]
    fn race_to_latch_scenario() {
        // Host with raceTo=7, players at 6 and 5.
        let mut state = heads_up_state(6, 5, 7);

        apply(&mut state, &score(GameMode::HeadsUp, 1, 1), 1_000).unwrap();
        assert_eq!(state.heads_up[0].score, 7);
        assert_eq!(state.latched_winner().map(|p| p.id), Some(1));

        // Further increase refused while latched.
        let err = apply(&mut state, &score(GameMode::HeadsUp, 1, 1), 2_000).unwrap_err();
        assert_eq!(err, Rejection::WinnerLatched);
        assert_eq!(state.heads_up[0].score, 7);

        // Corrective delta accepted and clears the latch.
        apply(&mut state, &score(GameMode::HeadsUp, 1, -1), 3_000).unwrap();
        assert_eq!(state.heads_up[0].score, 6);
        assert!(state.latched_winner().is_none());
    }

    #[test]
    fn latch_only_blocks_increases() {
        let mut state = heads_up_state(7, 0, 7);
        // The other player can still be corrected downward.
        apply(&mut state, &score(GameMode::HeadsUp, 2, -1), 0).unwrap();
        assert_eq!(state.heads_up[1].score, 0, "clamped at zero");
    }

    #[test]
    fn heads_up_scores_clamp_at_zero() {
        let mut state = heads_up_state(0, 0, 7);
        apply(&mut state, &score(GameMode::HeadsUp, 1, -3), 0).unwrap();
        assert_eq!(state.heads_up[0].score, 0);
    }

    #[test]
    fn rotation_scores_may_go_negative() {
        let mut state = SessionState::template();
        state.game_mode = GameMode::Rotation;
        apply(&mut state, &score(GameMode::Rotation, 1, -3), 0).unwrap();
        assert_eq!(state.rotation[0].score, -3);
    }

    #[test]
    fn score_unknown_player_rejected() {
        let mut state = SessionState::template();
        let err = apply(&mut state, &score(GameMode::HeadsUp, 42, 1), 0).unwrap_err();
        assert_eq!(err, Rejection::UnknownPlayer(42));
    }

    #[test]
    fn positive_score_rearms_shot_clock() {
        let mut state = SessionState::template();
        state.shot_clock.seconds = 4;
        state.shot_clock.running = true;

        apply(&mut state, &score(GameMode::HeadsUp, 1, 1), 0).unwrap();
        assert_eq!(state.shot_clock.seconds, state.shot_clock.initial_seconds);
        assert!(!state.shot_clock.running);
    }

    #[test]
    fn negative_score_leaves_shot_clock_alone() {
        let mut state = heads_up_state(3, 0, 7);
        state.shot_clock.seconds = 4;
        state.shot_clock.running = true;

        apply(&mut state, &score(GameMode::HeadsUp, 1, -1), 0).unwrap();
        assert_eq!(state.shot_clock.seconds, 4);
        assert!(state.shot_clock.running);
    }

    #[test]
    fn score_records_history() {
        let mut state = SessionState::template();
        apply(&mut state, &score(GameMode::HeadsUp, 1, 1), 60_000).unwrap();

        let entry = &state.history[0];
        assert_eq!(entry.kind, HistoryKind::Score);
        assert_eq!(entry.text, "PLAYER 01: +1 (0 -> 1)");
        assert_eq!(entry.time, "00:01");
    }

    #[test]
    fn add_player_bounds_and_naming() {
        let mut state = SessionState::template();
        apply(&mut state, &Intent::AddPlayer, 100).unwrap();
        apply(&mut state, &Intent::AddPlayer, 101).unwrap();
        assert_eq!(state.rotation.len(), 5);
        assert_eq!(state.rotation[3].name, "PLAYER D");
        assert_eq!(state.rotation[4].name, "PLAYER E");

        let err = apply(&mut state, &Intent::AddPlayer, 102).unwrap_err();
        assert_eq!(err, Rejection::RosterFull(MAX_ROTATION_PLAYERS));
    }

    #[test]
    fn remove_player_respects_minimum() {
        let mut state = SessionState::template();
        apply(&mut state, &Intent::RemovePlayer { id: 3 }, 0).unwrap();
        assert_eq!(state.rotation.len(), 2);

        let err = apply(&mut state, &Intent::RemovePlayer { id: 2 }, 0).unwrap_err();
        assert_eq!(err, Rejection::RosterAtMinimum(MIN_ROTATION_PLAYERS));
    }

    #[test]
    fn remove_unknown_player_rejected() {
        let mut state = SessionState::template();
        let err = apply(&mut state, &Intent::RemovePlayer { id: 99 }, 0).unwrap_err();
        assert_eq!(err, Rejection::UnknownPlayer(99));
    }

    #[test]
    fn move_player_swaps_neighbors() {
        let mut state = SessionState::template();
        apply(
            &mut state,
            &Intent::MovePlayer {
                index: 0,
                direction: MoveDirection::Down,
            },
            0,
        )
        .unwrap();
        assert_eq!(state.rotation[0].name, "PLAYER B");
        assert_eq!(state.rotation[1].name, "PLAYER A");

        let err = apply(
            &mut state,
            &Intent::MovePlayer {
                index: 0,
                direction: MoveDirection::Up,
            },
            0,
        )
        .unwrap_err();
        assert_eq!(err, Rejection::IndexOutOfRange(0));
    }

    #[test]
    fn rebalance_is_zero_sum() {
        let mut state = SessionState::template();
        state.game_mode = GameMode::Rotation;
        state.rotation[0].score = 4;
        state.rotation[1].score = -1;

        apply(&mut state, &Intent::Rebalance { id: 3 }, 0).unwrap();
        assert_eq!(state.rotation[2].score, -3);
        let total: i64 = state.rotation.iter().map(|p| p.score).sum();
        assert_eq!(total, 0);
        assert_eq!(state.history[0].kind, HistoryKind::Balance);
    }

    #[test]
    fn extreme_score_delta_saturates() {
        let mut state = SessionState::template();
        state.game_mode = GameMode::Rotation;
        state.rotation[0].score = 1;

        apply(&mut state, &score(GameMode::Rotation, 1, i64::MAX), 0).unwrap();
        assert_eq!(state.rotation[0].score, i64::MAX);

        apply(&mut state, &score(GameMode::Rotation, 2, i64::MIN), 0).unwrap();
        assert_eq!(state.rotation[1].score, i64::MIN);
    }

    #[test]
    fn rebalance_with_extreme_scores_does_not_overflow() {
        let mut state = SessionState::template();
        state.game_mode = GameMode::Rotation;
        state.rotation[0].score = i64::MAX;
        state.rotation[1].score = i64::MAX;

        apply(&mut state, &Intent::Rebalance { id: 3 }, 0).unwrap();
        assert_eq!(state.rotation[2].score, i64::MAX.saturating_neg());
    }

    #[test]
    fn toggle_break_swaps_between_players() {
        let mut state = SessionState::template();
        apply(&mut state, &Intent::ToggleBreak, 0).unwrap();
        assert_eq!(state.break_player_id, Some(1));
        apply(&mut state, &Intent::ToggleBreak, 0).unwrap();
        assert_eq!(state.break_player_id, Some(2));
        apply(&mut state, &Intent::ToggleBreak, 0).unwrap();
        assert_eq!(state.break_player_id, Some(1));
    }

    #[test]
    fn toggle_break_requires_heads_up() {
        let mut state = SessionState::template();
        state.game_mode = GameMode::Rotation;
        let err = apply(&mut state, &Intent::ToggleBreak, 0).unwrap_err();
        assert_eq!(err, Rejection::WrongMode);
    }

    #[test]
    fn clock_actions() {
        let mut state = SessionState::template();

        apply(
            &mut state,
            &Intent::Clock {
                action: ClockAction::Start,
                value: None,
            },
            0,
        )
        .unwrap();
        assert!(state.shot_clock.running);

        apply(
            &mut state,
            &Intent::Clock {
                action: ClockAction::Stop,
                value: None,
            },
            0,
        )
        .unwrap();
        assert!(!state.shot_clock.running);

        state.shot_clock.seconds = 5;
        apply(
            &mut state,
            &Intent::Clock {
                action: ClockAction::Extend,
                value: None,
            },
            0,
        )
        .unwrap();
        assert_eq!(state.shot_clock.seconds, 35);

        apply(
            &mut state,
            &Intent::Clock {
                action: ClockAction::SetDuration,
                value: Some(60),
            },
            0,
        )
        .unwrap();
        assert_eq!(state.shot_clock.initial_seconds, 60);
        assert_eq!(state.shot_clock.seconds, 60);

        apply(
            &mut state,
            &Intent::Clock {
                action: ClockAction::Reset,
                value: None,
            },
            0,
        )
        .unwrap();
        assert_eq!(state.shot_clock.seconds, 60);
        assert!(!state.shot_clock.running);
    }

    #[test]
    fn clock_start_from_zero_rearms_first() {
        let mut state = SessionState::template();
        state.shot_clock.seconds = 0;
        apply(
            &mut state,
            &Intent::Clock {
                action: ClockAction::Start,
                value: None,
            },
            0,
        )
        .unwrap();
        assert_eq!(state.shot_clock.seconds, state.shot_clock.initial_seconds);
        assert!(state.shot_clock.running);
    }

    #[test]
    fn clock_set_duration_requires_value() {
        let mut state = SessionState::template();
        let err = apply(
            &mut state,
            &Intent::Clock {
                action: ClockAction::SetDuration,
                value: None,
            },
            0,
        )
        .unwrap_err();
        assert!(matches!(err, Rejection::InvalidValue(_)));
    }

    #[test]
    fn reset_preserves_names_and_settings() {
        let mut state = heads_up_state(7, 3, 9);
        state.heads_up[0].name = "ANNA".to_string();
        state.unit_price = 5_000;
        state.table_bill = 240_000;
        state.shot_clock.initial_seconds = 60;
        state.break_player_id = Some(2);

        apply(&mut state, &Intent::Reset, 0).unwrap();

        assert_eq!(state.heads_up[0].name, "ANNA");
        assert_eq!(state.heads_up[0].score, 0);
        assert_eq!(state.heads_up[1].score, 0);
        assert_eq!(state.race_to, 9);
        assert_eq!(state.unit_price, 5_000);
        assert_eq!(state.table_bill, 0, "table bill clears on reset");
        assert_eq!(state.shot_clock.initial_seconds, 60);
        assert_eq!(state.break_player_id, None);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].kind, HistoryKind::System);
        assert!(state.latched_winner().is_none());
    }

    #[test]
    fn rejection_leaves_state_untouched() {
        let state_before = heads_up_state(7, 5, 7);
        let mut state = state_before.clone();
        let _ = apply(&mut state, &score(GameMode::HeadsUp, 1, 1), 0).unwrap_err();
        assert_eq!(state, state_before);
    }
}
