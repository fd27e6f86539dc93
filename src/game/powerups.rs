//! Skip and block: one ability per player per match.

use crate::game::error::EngineError;
use crate::game::types::{Ability, MatchEvent, MatchState};

pub fn validate_ability(state: &MatchState, ability: Ability) -> Result<(), EngineError> {
    state.require_in_progress()?;
    let player = state.current();
    if !player.ability_available(ability) {
        return Err(EngineError::AbilityAlreadyUsed);
    }
    // A blocked player may still block back, but cannot skip.
    if ability == Ability::Skip && player.is_blocked {
        return Err(EngineError::ActionNotAllowed(format!(
            "{} is blocked and cannot skip",
            player.name
        )));
    }
    Ok(())
}

/// Flag the opponent and spend the current player's ability allowance.
///
/// The turn does not end here; the caller advances it separately.
pub fn apply_ability(state: &mut MatchState, ability: Ability) {
    let acting = state.current_player_index;
    let target = state.opponent_index();

    let opponent = &mut state.players[target];
    match ability {
        Ability::Skip => opponent.is_skipped = true,
        Ability::Block => opponent.is_blocked = true,
    }
    state.players[acting].consume_abilities();

    tracing::info!(player = acting, target, %ability, "ability used");
    state.history.push(MatchEvent::AbilityUsed {
        player: acting,
        ability,
        target,
    });
}

pub fn use_ability(state: &mut MatchState, ability: Ability) -> Result<(), EngineError> {
    validate_ability(state, ability)?;
    apply_ability(state, ability);
    Ok(())
}
