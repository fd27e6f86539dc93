//! Win evaluation, run inside every transition that changes genre counts.

use crate::game::types::{MatchEvent, MatchState, MatchStatus};

/// Finish the match if `acting` has reached their target. Returns true on a win.
pub fn evaluate(state: &mut MatchState, acting: usize) -> bool {
    if state.status != MatchStatus::InProgress {
        return false;
    }
    let player = &state.players[acting];
    if !player.has_reached_target() {
        return false;
    }

    tracing::info!(
        player = acting,
        name = %player.name,
        genre = %player.target_genre,
        count = player.target_count(),
        turn = state.turn_count,
        "match won"
    );
    state.status = MatchStatus::Finished;
    state.winner_index = Some(acting);
    state.history.push(MatchEvent::MatchWon { player: acting });
    true
}
