//! Bot strategy trait and implementations.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::config::{BotProfile, ConfigError};
use crate::engine::models::MovieId;
use crate::game::session::GameSession;
use crate::game::types::{other, Ability, Player};

/// One step a bot takes on its turn. `Pass` ends the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Select(MovieId),
    UseAbility(Ability),
    Pass,
}

/// A bot picks its next step from the current session state.
///
/// Implementations must eventually return `Pass` within a turn: the arena
/// calls `choose_action` repeatedly until it does.
pub trait BotStrategy: Send + Sync {
    fn choose_action(&self, session: &GameSession, rng: &mut StdRng) -> BotAction;
}

fn usable_abilities(player: &Player) -> Vec<Ability> {
    [Ability::Skip, Ability::Block]
        .into_iter()
        .filter(|a| player.ability_available(*a))
        .filter(|a| *a != Ability::Skip || !player.is_blocked)
        .collect()
}

fn can_select(player: &Player) -> bool {
    !player.is_blocked && !player.is_skipped && !player.has_selected_movie_this_turn
}

/// Plays a uniformly random connected movie and sometimes fires its ability.
pub struct RandomStrategy {
    pub ability_chance: f64,
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self { ability_chance: 0.1 }
    }
}

impl BotStrategy for RandomStrategy {
    fn choose_action(&self, session: &GameSession, rng: &mut StdRng) -> BotAction {
        let me = session.state().current();

        let abilities = usable_abilities(me);
        if !abilities.is_empty() && rng.gen_bool(self.ability_chance.clamp(0.0, 1.0)) {
            if let Some(ability) = abilities.choose(rng) {
                return BotAction::UseAbility(*ability);
            }
        }

        if can_select(me) {
            let playable = session.playable_movies();
            if let Some(movie) = playable.choose(rng) {
                return BotAction::Select(movie.id);
            }
        }
        BotAction::Pass
    }
}

/// Prefers movies in its own target genre, avoids feeding the opponent's,
/// and saves its ability for when the opponent is one movie from winning.
pub struct GreedyGenreStrategy;

impl BotStrategy for GreedyGenreStrategy {
    fn choose_action(&self, session: &GameSession, rng: &mut StdRng) -> BotAction {
        let state = session.state();
        let me = state.current();
        let opponent = &state.players[other(state.current_player_index)];

        if opponent.remaining() <= 1 {
            let abilities = usable_abilities(me);
            if abilities.contains(&Ability::Skip) {
                return BotAction::UseAbility(Ability::Skip);
            }
            if abilities.contains(&Ability::Block) {
                return BotAction::UseAbility(Ability::Block);
            }
        }

        if !can_select(me) {
            return BotAction::Pass;
        }

        let playable = session.playable_movies();
        let score = |has_mine: bool, has_theirs: bool| -> i32 {
            i32::from(has_mine) * 2 - i32::from(has_theirs)
        };
        let best = playable
            .iter()
            .map(|m| score(m.has_genre(&me.target_genre), m.has_genre(&opponent.target_genre)))
            .max();
        let Some(best) = best else {
            return BotAction::Pass;
        };
        let top: Vec<MovieId> = playable
            .iter()
            .filter(|m| {
                score(m.has_genre(&me.target_genre), m.has_genre(&opponent.target_genre)) == best
            })
            .map(|m| m.id)
            .collect();
        match top.choose(rng) {
            Some(id) => BotAction::Select(*id),
            None => BotAction::Pass,
        }
    }
}

/// Build the strategy a profile describes.
pub fn build_strategy(profile: &BotProfile) -> Result<Box<dyn BotStrategy>, ConfigError> {
    match profile.strategy_type.as_str() {
        "random" => Ok(Box::new(RandomStrategy {
            ability_chance: profile.effective_ability_chance(),
        })),
        "greedy" => Ok(Box::new(GreedyGenreStrategy)),
        other => Err(ConfigError::UnknownStrategy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;

    use super::*;
    use crate::engine::catalog::InMemoryCatalog;
    use crate::engine::models::{Genre, GenreSet, Movie, Person};
    use crate::game::types::PlayerConfig;

    fn session() -> GameSession {
        let m = |id: u64, genre: &str| Movie {
            id: MovieId(id),
            title: format!("Movie {}", id),
            release_year: 2000,
            genres: GenreSet::from([Genre::new(genre)]),
            cast: vec![Person::new(1, "Shared")],
            crew: vec![],
        };
        let catalog = InMemoryCatalog::from_movies(vec![
            m(1, "comedy"),
            m(2, "horror"),
            m(3, "drama"),
        ])
        .unwrap();
        GameSession::start_match(
            &[PlayerConfig::new("Ann", "horror", 2), PlayerConfig::new("Bob", "comedy", 2)],
            Arc::new(catalog),
        )
        .unwrap()
    }

    #[test]
    fn test_greedy_picks_target_genre() {
        let s = session();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            GreedyGenreStrategy.choose_action(&s, &mut rng),
            BotAction::Select(MovieId(2))
        );
    }

    #[test]
    fn test_greedy_skips_when_opponent_is_close() {
        let mut s = session();
        s.select_movie(MovieId(3)).unwrap();
        s.advance_turn().unwrap();
        s.select_movie(MovieId(1)).unwrap();
        s.advance_turn().unwrap();
        // Bob needs one more comedy.
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            GreedyGenreStrategy.choose_action(&s, &mut rng),
            BotAction::UseAbility(Ability::Skip)
        );
    }

    #[test]
    fn test_random_passes_after_selecting() {
        let mut s = session();
        let strategy = RandomStrategy { ability_chance: 0.0 };
        let mut rng = StdRng::seed_from_u64(1);
        let BotAction::Select(id) = strategy.choose_action(&s, &mut rng) else {
            panic!("expected a selection");
        };
        s.select_movie(id).unwrap();
        assert_eq!(strategy.choose_action(&s, &mut rng), BotAction::Pass);
    }

    #[test]
    fn test_random_always_uses_ability_at_full_chance() {
        let s = session();
        let strategy = RandomStrategy { ability_chance: 1.0 };
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            strategy.choose_action(&s, &mut rng),
            BotAction::UseAbility(_)
        ));
    }

    #[test]
    fn test_build_strategy_rejects_unknown_type() {
        let profile = BotProfile {
            description: None,
            strategy_type: "mcts".into(),
            ability_chance: None,
        };
        assert!(matches!(build_strategy(&profile), Err(ConfigError::UnknownStrategy(_))));
    }
}
