//! Turn controller: hands the turn to the next seat, honoring skips.

use crate::game::error::EngineError;
use crate::game::types::{other, MatchEvent, MatchState};

/// At most one seat can be skipped at a time, so one extra hop suffices.
const MAX_SKIP_HOPS: usize = 1;

/// Seats the turn passes through: skipped seats first, then the one that acts.
#[derive(Debug, PartialEq, Eq)]
struct TurnPlan {
    skipped: Vec<usize>,
    next: usize,
}

fn plan_advance(state: &MatchState) -> Result<TurnPlan, EngineError> {
    let mut skipped = Vec::new();
    let mut index = state.current_player_index;
    loop {
        index = other(index);
        if !state.players[index].is_skipped {
            return Ok(TurnPlan { skipped, next: index });
        }
        if skipped.len() == MAX_SKIP_HOPS {
            return Err(EngineError::InvariantViolation(
                "both players are marked skipped".into(),
            ));
        }
        skipped.push(index);
    }
}

/// End the current player's turn.
///
/// The departing player's per-turn flags reset and a block that suppressed
/// this turn is lifted. A skipped seat is passed over and its flag cleared.
/// `turn_count` grows each time seat 0 comes around again, including when it
/// is only passed over.
pub fn advance_turn(state: &mut MatchState) -> Result<(), EngineError> {
    state.require_in_progress()?;
    let plan = plan_advance(state)?;

    let departing = state.current_mut();
    departing.has_selected_movie_this_turn = false;
    departing.is_blocked = false;

    for index in plan.skipped.iter().copied().chain(std::iter::once(plan.next)) {
        state.current_player_index = index;
        if index == 0 {
            state.turn_count += 1;
        }
        let player = &mut state.players[index];
        if player.is_skipped {
            player.is_skipped = false;
            tracing::info!(player = index, name = %player.name, "turn skipped");
            state.history.push(MatchEvent::TurnSkipped { player: index });
        }
    }

    tracing::debug!(
        player = state.current_player_index,
        turn = state.turn_count,
        blocked = state.current().is_blocked,
        "turn advanced"
    );
    state.history.push(MatchEvent::TurnAdvanced {
        player: state.current_player_index,
        turn_count: state.turn_count,
    });
    Ok(())
}
