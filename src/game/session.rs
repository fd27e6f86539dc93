//! `GameSession`: the aggregate that owns one match and exposes its commands.
//!
//! Each command validates fully before it mutates, so a rejected command
//! leaves the match exactly as it was. A session is single-writer: callers
//! serialize access (see `engine::registry`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::catalog::CatalogLookup;
use crate::engine::models::{Movie, MovieId, MovieSummary};
use crate::game::error::EngineError;
use crate::game::types::{
    Ability, MatchEvent, MatchSnapshot, MatchState, MatchStatus, Player, PlayerConfig,
    PLAYER_COUNT,
};
use crate::game::{moves, powerups, turn};

/// A command against a running match, as received from a shim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SelectMovie { movie_id: MovieId },
    UseSkip,
    UseBlock,
    UseAbility { ability: Ability },
    AdvanceTurn,
    GetStatus,
}

pub struct GameSession {
    state: MatchState,
    catalog: Arc<dyn CatalogLookup>,
    /// Set once an invariant violation is observed; the session is dead after that.
    poisoned: Option<String>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Validate both seats and build a session that has not started yet.
    pub fn new(configs: &[PlayerConfig], catalog: Arc<dyn CatalogLookup>) -> Result<Self, EngineError> {
        if configs.len() != PLAYER_COUNT {
            return Err(EngineError::InvalidConfig(format!(
                "a match needs exactly {} players, got {}",
                PLAYER_COUNT,
                configs.len()
            )));
        }
        for config in configs {
            config.validate()?;
        }
        let players = [Player::new(&configs[0]), Player::new(&configs[1])];
        Ok(Self {
            state: MatchState::new(players),
            catalog,
            poisoned: None,
        })
    }

    /// Move a fresh session to `InProgress`.
    pub fn begin(&mut self) -> Result<MatchSnapshot, EngineError> {
        self.guard()?;
        if self.state.status != MatchStatus::NotStarted {
            return Err(EngineError::ActionNotAllowed("match already started".into()));
        }
        self.state.status = MatchStatus::InProgress;
        self.state.history.push(MatchEvent::MatchStarted);
        tracing::info!(
            p0 = %self.state.players[0].name,
            p0_genre = %self.state.players[0].target_genre,
            p1 = %self.state.players[1].name,
            p1_genre = %self.state.players[1].target_genre,
            "match started"
        );
        Ok(self.state.snapshot())
    }

    /// Build and start a session in one step.
    pub fn start_match(configs: &[PlayerConfig], catalog: Arc<dyn CatalogLookup>) -> Result<Self, EngineError> {
        let mut session = Self::new(configs, catalog)?;
        session.begin()?;
        Ok(session)
    }

    pub fn select_movie(&mut self, movie_id: MovieId) -> Result<MatchSnapshot, EngineError> {
        self.guard()?;
        let validated = moves::validate_selection(&self.state, self.catalog.as_ref(), movie_id)
            .inspect_err(|e| tracing::debug!(%movie_id, error = %e, "selection rejected"))?;
        moves::apply_selection(&mut self.state, validated);
        Ok(self.state.snapshot())
    }

    pub fn use_ability(&mut self, ability: Ability) -> Result<MatchSnapshot, EngineError> {
        self.guard()?;
        powerups::use_ability(&mut self.state, ability)
            .inspect_err(|e| tracing::debug!(%ability, error = %e, "ability rejected"))?;
        Ok(self.state.snapshot())
    }

    pub fn use_skip(&mut self) -> Result<MatchSnapshot, EngineError> {
        self.use_ability(Ability::Skip)
    }

    pub fn use_block(&mut self) -> Result<MatchSnapshot, EngineError> {
        self.use_ability(Ability::Block)
    }

    pub fn advance_turn(&mut self) -> Result<MatchSnapshot, EngineError> {
        self.guard()?;
        if let Err(e) = turn::advance_turn(&mut self.state) {
            if let EngineError::InvariantViolation(reason) = &e {
                tracing::error!(%reason, "session poisoned");
                self.poisoned = Some(reason.clone());
            }
            return Err(e);
        }
        Ok(self.state.snapshot())
    }

    pub fn status(&self) -> MatchSnapshot {
        self.state.snapshot()
    }

    pub fn execute(&mut self, command: Command) -> Result<MatchSnapshot, EngineError> {
        match command {
            Command::SelectMovie { movie_id } => self.select_movie(movie_id),
            Command::UseSkip => self.use_skip(),
            Command::UseBlock => self.use_block(),
            Command::UseAbility { ability } => self.use_ability(ability),
            Command::AdvanceTurn => self.advance_turn(),
            Command::GetStatus => Ok(self.status()),
        }
    }

    /// Catalog search with already played movies filtered out.
    pub fn search(&self, query: &str) -> Vec<MovieSummary> {
        self.catalog
            .search(query)
            .iter()
            .filter(|m| !self.state.is_used(m.id))
            .map(|m| m.summary())
            .collect()
    }

    /// Unplayed movies that connect to the last movie (any movie on the first move).
    pub fn playable_movies(&self) -> Vec<Arc<Movie>> {
        let candidates = match &self.state.last_movie {
            None => self.catalog.search(""),
            Some(last) => self.catalog.neighbors(last),
        };
        candidates
            .into_iter()
            .filter(|m| !self.state.is_used(m.id))
            .collect()
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    fn guard(&self) -> Result<(), EngineError> {
        match &self.poisoned {
            Some(reason) => Err(EngineError::InvariantViolation(reason.clone())),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::InMemoryCatalog;
    use crate::engine::models::{Genre, GenreSet, Person};

    fn catalog() -> Arc<dyn CatalogLookup> {
        let m = |id: u64, genre: &str, people: &[u64]| Movie {
            id: MovieId(id),
            title: format!("Movie {}", id),
            release_year: 1990 + id as i32,
            genres: GenreSet::from([Genre::new(genre)]),
            cast: people.iter().map(|p| Person::new(*p, format!("P{}", p))).collect(),
            crew: vec![],
        };
        Arc::new(
            InMemoryCatalog::from_movies(vec![
                m(1, "horror", &[1]),
                m(2, "comedy", &[1, 2]),
                m(3, "horror", &[2]),
                m(4, "drama", &[50]),
            ])
            .unwrap(),
        )
    }

    fn configs() -> Vec<PlayerConfig> {
        vec![
            PlayerConfig::new("Ann", "horror", 3),
            PlayerConfig::new("Bob", "comedy", 3),
        ]
    }

    #[test]
    fn test_new_is_not_started() {
        let mut s = GameSession::new(&configs(), catalog()).unwrap();
        assert_eq!(s.status().status, MatchStatus::NotStarted);
        assert_eq!(s.select_movie(MovieId(1)).unwrap_err(), EngineError::SessionNotActive);
        assert_eq!(s.begin().unwrap().status, MatchStatus::InProgress);
        assert!(matches!(s.begin(), Err(EngineError::ActionNotAllowed(_))));
    }

    #[test]
    fn test_wrong_player_count() {
        let one = vec![PlayerConfig::new("Ann", "horror", 3)];
        assert!(matches!(
            GameSession::new(&one, catalog()),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_execute_dispatches() {
        let mut s = GameSession::start_match(&configs(), catalog()).unwrap();
        let snap = s.execute(Command::SelectMovie { movie_id: MovieId(1) }).unwrap();
        assert_eq!(snap.last_movie.unwrap().id, MovieId(1));
        let snap = s.execute(Command::UseAbility { ability: Ability::Block }).unwrap();
        assert!(snap.players[1].player.is_blocked);
        let snap = s.execute(Command::AdvanceTurn).unwrap();
        assert_eq!(snap.current_player_index, 1);
        assert_eq!(s.execute(Command::GetStatus).unwrap(), s.status());
    }

    #[test]
    fn test_command_json_shape() {
        let cmd: Command = serde_json::from_str(r#"{"command": "select_movie", "movie_id": 7}"#).unwrap();
        assert_eq!(cmd, Command::SelectMovie { movie_id: MovieId(7) });
        let cmd: Command = serde_json::from_str(r#"{"command": "use_ability", "ability": "skip"}"#).unwrap();
        assert_eq!(cmd, Command::UseAbility { ability: Ability::Skip });
    }

    #[test]
    fn test_search_hides_played_movies() {
        let mut s = GameSession::start_match(&configs(), catalog()).unwrap();
        assert_eq!(s.search("movie").len(), 4);
        s.select_movie(MovieId(1)).unwrap();
        let ids: Vec<MovieId> = s.search("movie").iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![MovieId(2), MovieId(3), MovieId(4)]);
    }

    #[test]
    fn test_playable_movies_follow_last_movie() {
        let mut s = GameSession::start_match(&configs(), catalog()).unwrap();
        assert_eq!(s.playable_movies().len(), 4);
        s.select_movie(MovieId(1)).unwrap();
        let ids: Vec<MovieId> = s.playable_movies().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![MovieId(2)]);
    }

    #[test]
    fn test_invariant_violation_poisons_session() {
        let mut s = GameSession::start_match(&configs(), catalog()).unwrap();
        s.state_mut().players[0].is_skipped = true;
        s.state_mut().players[1].is_skipped = true;
        assert!(matches!(s.advance_turn(), Err(EngineError::InvariantViolation(_))));
        assert!(s.is_poisoned());
        assert!(matches!(s.select_movie(MovieId(1)), Err(EngineError::InvariantViolation(_))));
        assert!(matches!(s.use_block(), Err(EngineError::InvariantViolation(_))));
        // Status is still readable.
        assert_eq!(s.status().status, MatchStatus::InProgress);
    }

    #[test]
    fn test_rejected_command_leaves_state_unchanged() {
        let mut s = GameSession::start_match(&configs(), catalog()).unwrap();
        s.select_movie(MovieId(1)).unwrap();
        s.advance_turn().unwrap();
        let before = s.status();
        assert!(s.select_movie(MovieId(4)).is_err());
        assert!(s.select_movie(MovieId(1)).is_err());
        assert!(s.select_movie(MovieId(99)).is_err());
        assert_eq!(s.status(), before);
    }
}
