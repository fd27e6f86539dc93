//! Movie selection: validation first, then a single atomic apply.

use std::sync::Arc;

use crate::engine::catalog::CatalogLookup;
use crate::engine::models::{Movie, MovieId};
use crate::game::connectivity::{are_connected, shared_people, Link};
use crate::game::error::EngineError;
use crate::game::types::{MatchEvent, MatchState};
use crate::game::win;

/// A selection that passed every precondition.
#[derive(Debug)]
pub struct ValidatedMove {
    pub movie: Arc<Movie>,
    pub links: Vec<Link>,
}

/// Check the selection preconditions in order, reporting the first failure.
pub fn validate_selection(
    state: &MatchState,
    catalog: &dyn CatalogLookup,
    movie_id: MovieId,
) -> Result<ValidatedMove, EngineError> {
    state.require_in_progress()?;

    let player = state.current();
    if player.is_skipped {
        return Err(EngineError::ActionNotAllowed(format!("{} is skipped this turn", player.name)));
    }
    if player.is_blocked {
        return Err(EngineError::ActionNotAllowed(format!(
            "{} is blocked from selecting a movie this turn",
            player.name
        )));
    }
    if player.has_selected_movie_this_turn {
        return Err(EngineError::ActionNotAllowed(format!(
            "{} already selected a movie this turn",
            player.name
        )));
    }

    let movie = catalog
        .find_by_id(movie_id)
        .ok_or(EngineError::MovieNotFound(movie_id))?;

    if state.is_used(movie.id) {
        return Err(EngineError::MovieAlreadyUsed(movie.id));
    }

    let links = match &state.last_movie {
        None => Vec::new(),
        Some(last) => {
            if !are_connected(last, &movie) {
                return Err(EngineError::NotConnected {
                    from: last.id,
                    to: movie.id,
                });
            }
            shared_people(last, &movie)
        }
    };

    Ok(ValidatedMove { movie, links })
}

/// Record a validated selection for the current player, then check for a win.
///
/// Returns true when the selection won the match.
pub fn apply_selection(state: &mut MatchState, validated: ValidatedMove) -> bool {
    let acting = state.current_player_index;
    let ValidatedMove { movie, links } = validated;

    let player = &mut state.players[acting];
    player.record_movie(&movie);
    player.has_selected_movie_this_turn = true;
    tracing::info!(
        player = acting,
        movie_id = %movie.id,
        title = %movie.title,
        target_count = player.target_count(),
        threshold = player.win_threshold,
        links = links.len(),
        "movie selected"
    );

    state.globally_used_movie_ids.insert(movie.id);
    state.history.push(MatchEvent::MovieSelected {
        player: acting,
        movie_id: movie.id,
        title: movie.title.clone(),
        links,
    });
    state.last_movie = Some(movie);

    win::evaluate(state, acting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::InMemoryCatalog;
    use crate::engine::models::{Genre, GenreSet, Person};
    use crate::game::types::{MatchStatus, Player, PlayerConfig};

    fn movie(id: u64, genre: &str, people: &[u64]) -> Movie {
        Movie {
            id: MovieId(id),
            title: format!("Movie {}", id),
            release_year: 2000,
            genres: GenreSet::from([Genre::new(genre)]),
            cast: people.iter().map(|p| Person::new(*p, format!("Person {}", p))).collect(),
            crew: vec![],
        }
    }

    fn setup() -> (MatchState, InMemoryCatalog) {
        let catalog = InMemoryCatalog::from_movies(vec![
            movie(1, "horror", &[10]),
            movie(2, "horror", &[10, 11]),
            movie(3, "comedy", &[99]),
        ])
        .unwrap();
        let mut state = MatchState::new([
            Player::new(&PlayerConfig::new("Ann", "horror", 5)),
            Player::new(&PlayerConfig::new("Bob", "comedy", 5)),
        ]);
        state.status = MatchStatus::InProgress;
        (state, catalog)
    }

    #[test]
    fn test_first_move_needs_no_connection() {
        let (mut state, catalog) = setup();
        let v = validate_selection(&state, &catalog, MovieId(3)).unwrap();
        assert!(v.links.is_empty());
        assert!(!apply_selection(&mut state, v));
        assert_eq!(state.last_movie.as_ref().unwrap().id, MovieId(3));
        assert!(state.players[0].has_selected_movie_this_turn);
        assert!(state.is_used(MovieId(3)));
    }

    #[test]
    fn test_precondition_order() {
        let (mut state, catalog) = setup();
        // Already selected beats unknown movie.
        state.players[0].has_selected_movie_this_turn = true;
        assert!(matches!(
            validate_selection(&state, &catalog, MovieId(404)),
            Err(EngineError::ActionNotAllowed(_))
        ));
        state.players[0].has_selected_movie_this_turn = false;
        assert_eq!(
            validate_selection(&state, &catalog, MovieId(404)).unwrap_err(),
            EngineError::MovieNotFound(MovieId(404))
        );

        let v = validate_selection(&state, &catalog, MovieId(1)).unwrap();
        apply_selection(&mut state, v);
        state.players[0].has_selected_movie_this_turn = false;
        // Used beats not-connected: movie 1 is trivially "connected" to itself
        // but must be rejected as used first.
        assert_eq!(
            validate_selection(&state, &catalog, MovieId(1)).unwrap_err(),
            EngineError::MovieAlreadyUsed(MovieId(1))
        );
        assert_eq!(
            validate_selection(&state, &catalog, MovieId(3)).unwrap_err(),
            EngineError::NotConnected { from: MovieId(1), to: MovieId(3) }
        );
    }

    #[test]
    fn test_blocked_and_skipped_cannot_select() {
        let (mut state, catalog) = setup();
        state.players[0].is_blocked = true;
        assert!(matches!(
            validate_selection(&state, &catalog, MovieId(1)),
            Err(EngineError::ActionNotAllowed(_))
        ));
        state.players[0].is_blocked = false;
        state.players[0].is_skipped = true;
        assert!(matches!(
            validate_selection(&state, &catalog, MovieId(1)),
            Err(EngineError::ActionNotAllowed(_))
        ));
    }

    #[test]
    fn test_inactive_match_rejected_first() {
        let (mut state, catalog) = setup();
        state.status = MatchStatus::Finished;
        state.players[0].is_blocked = true;
        assert_eq!(
            validate_selection(&state, &catalog, MovieId(404)).unwrap_err(),
            EngineError::SessionNotActive
        );
    }

    #[test]
    fn test_apply_records_links_in_history() {
        let (mut state, catalog) = setup();
        let v = validate_selection(&state, &catalog, MovieId(1)).unwrap();
        apply_selection(&mut state, v);
        state.current_player_index = 1;
        let v = validate_selection(&state, &catalog, MovieId(2)).unwrap();
        apply_selection(&mut state, v);
        match state.history.last() {
            Some(MatchEvent::MovieSelected { player, links, .. }) => {
                assert_eq!(*player, 1);
                assert_eq!(links.len(), 1);
                assert_eq!(links[0].person.name, "Person 10");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(state.players[1].genre_counts[&Genre::new("horror")], 1);
    }
}
