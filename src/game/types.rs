//! Match state types: players, status, history events and snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::models::{Genre, Movie, MovieId, MovieSummary};
use crate::game::connectivity::Link;
use crate::game::error::EngineError;

pub const PLAYER_COUNT: usize = 2;

/// Externally supplied setup for one seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub target_genre: String,
    /// Signed so that a non-positive value can be reported instead of failing to parse.
    pub win_threshold: i64,
}

impl PlayerConfig {
    pub fn new(name: impl Into<String>, target_genre: impl Into<String>, win_threshold: i64) -> Self {
        Self {
            name: name.into(),
            target_genre: target_genre.into(),
            win_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidConfig("player name is empty".into()));
        }
        if Genre::new(&self.target_genre).is_empty() {
            return Err(EngineError::InvalidConfig(format!(
                "player {} has no target genre",
                self.name.trim()
            )));
        }
        if self.win_threshold <= 0 || self.win_threshold > i64::from(u32::MAX) {
            return Err(EngineError::InvalidConfig(format!(
                "win threshold must be a positive integer, got {}",
                self.win_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Skip,
    Block,
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ability::Skip => f.write_str("skip"),
            Ability::Block => f.write_str("block"),
        }
    }
}

/// Per-seat progress and power-up flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub target_genre: Genre,
    pub win_threshold: u32,
    pub genre_counts: BTreeMap<Genre, u32>,
    pub used_movie_ids: BTreeSet<MovieId>,
    /// Movies this player has played, in play order.
    pub movies: Vec<MovieSummary>,
    pub skip_available: bool,
    pub block_available: bool,
    pub is_skipped: bool,
    pub is_blocked: bool,
    pub has_selected_movie_this_turn: bool,
}

impl Player {
    /// Build a fresh player from an already validated config.
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            name: config.name.trim().to_string(),
            target_genre: Genre::new(&config.target_genre),
            win_threshold: u32::try_from(config.win_threshold).unwrap_or(u32::MAX),
            genre_counts: BTreeMap::new(),
            used_movie_ids: BTreeSet::new(),
            movies: Vec::new(),
            skip_available: true,
            block_available: true,
            is_skipped: false,
            is_blocked: false,
            has_selected_movie_this_turn: false,
        }
    }

    pub fn target_count(&self) -> u32 {
        self.genre_counts.get(&self.target_genre).copied().unwrap_or(0)
    }

    pub fn has_reached_target(&self) -> bool {
        self.target_count() >= self.win_threshold
    }

    /// Movies still needed in the target genre.
    pub fn remaining(&self) -> u32 {
        self.win_threshold.saturating_sub(self.target_count())
    }

    pub fn ability_available(&self, ability: Ability) -> bool {
        match ability {
            Ability::Skip => self.skip_available,
            Ability::Block => self.block_available,
        }
    }

    /// Using either ability spends the whole allowance.
    pub fn consume_abilities(&mut self) {
        self.skip_available = false;
        self.block_available = false;
    }

    /// Add a movie to this player's collection and genre tallies.
    pub fn record_movie(&mut self, movie: &Movie) {
        if !self.used_movie_ids.insert(movie.id) {
            return;
        }
        self.movies.push(movie.summary());
        for genre in &movie.genres {
            *self.genre_counts.entry(genre.clone()).or_insert(0) += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    Finished,
}

/// Everything that happened in a match, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    MatchStarted,
    MovieSelected {
        player: usize,
        movie_id: MovieId,
        title: String,
        links: Vec<Link>,
    },
    AbilityUsed {
        player: usize,
        ability: Ability,
        target: usize,
    },
    TurnSkipped {
        player: usize,
    },
    TurnAdvanced {
        player: usize,
        turn_count: u32,
    },
    MatchWon {
        player: usize,
    },
}

/// Authoritative state of one match.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub players: [Player; PLAYER_COUNT],
    pub current_player_index: usize,
    pub turn_count: u32,
    pub last_movie: Option<Arc<Movie>>,
    pub globally_used_movie_ids: BTreeSet<MovieId>,
    pub status: MatchStatus,
    pub winner_index: Option<usize>,
    pub history: Vec<MatchEvent>,
}

impl MatchState {
    pub fn new(players: [Player; PLAYER_COUNT]) -> Self {
        Self {
            players,
            current_player_index: 0,
            turn_count: 1,
            last_movie: None,
            globally_used_movie_ids: BTreeSet::new(),
            status: MatchStatus::NotStarted,
            winner_index: None,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &Player {
        &self.players[self.current_player_index]
    }

    pub fn current_mut(&mut self) -> &mut Player {
        &mut self.players[self.current_player_index]
    }

    pub fn opponent_index(&self) -> usize {
        other(self.current_player_index)
    }

    pub fn is_used(&self, id: MovieId) -> bool {
        self.globally_used_movie_ids.contains(&id)
    }

    pub fn require_in_progress(&self) -> Result<(), EngineError> {
        if self.status == MatchStatus::InProgress {
            Ok(())
        } else {
            Err(EngineError::SessionNotActive)
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    target_genre_count: p.target_count(),
                    player: p.clone(),
                })
                .collect(),
            current_player_index: self.current_player_index,
            turn_count: self.turn_count,
            last_movie: self.last_movie.as_deref().cloned(),
            globally_used_movie_ids: self.globally_used_movie_ids.iter().copied().collect(),
            status: self.status,
            winner_index: self.winner_index,
            history: self.history.clone(),
        }
    }
}

/// Index of the other seat.
pub fn other(index: usize) -> usize {
    1 - index
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(flatten)]
    pub player: Player,
    pub target_genre_count: u32,
}

/// Read-only projection of `MatchState` for callers and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub current_player_index: usize,
    pub turn_count: u32,
    pub last_movie: Option<Movie>,
    pub globally_used_movie_ids: Vec<MovieId>,
    pub status: MatchStatus,
    pub winner_index: Option<usize>,
    pub history: Vec<MatchEvent>,
}

impl MatchSnapshot {
    pub fn winner_name(&self) -> Option<&str> {
        self.winner_index
            .and_then(|i| self.players.get(i))
            .map(|p| p.player.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::{GenreSet, Person};

    fn horror(id: u64) -> Movie {
        Movie {
            id: MovieId(id),
            title: format!("Horror {}", id),
            release_year: 1980,
            genres: GenreSet::from([Genre::new("Horror"), Genre::new("Thriller")]),
            cast: vec![Person::new(1, "Jamie Lee Curtis")],
            crew: vec![],
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(PlayerConfig::new("Ann", "horror", 3).validate().is_ok());
        assert!(matches!(
            PlayerConfig::new("  ", "horror", 3).validate(),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlayerConfig::new("Ann", "horror", 0).validate(),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlayerConfig::new("Ann", "horror", -2).validate(),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlayerConfig::new("Ann", " ", 2).validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_new_player_normalizes() {
        let p = Player::new(&PlayerConfig::new(" Ann ", "Sci-Fi", 3));
        assert_eq!(p.name, "Ann");
        assert_eq!(p.target_genre.as_str(), "science fiction");
        assert!(p.skip_available && p.block_available);
        assert_eq!(p.remaining(), 3);
    }

    #[test]
    fn test_record_movie_counts_every_genre_once() {
        let mut p = Player::new(&PlayerConfig::new("Ann", "horror", 2));
        p.record_movie(&horror(1));
        p.record_movie(&horror(1));
        assert_eq!(p.target_count(), 1);
        assert_eq!(p.genre_counts[&Genre::new("thriller")], 1);
        assert_eq!(p.movies.len(), 1);
        p.record_movie(&horror(2));
        assert!(p.has_reached_target());
    }

    #[test]
    fn test_consume_abilities_spends_both() {
        let mut p = Player::new(&PlayerConfig::new("Ann", "horror", 2));
        p.consume_abilities();
        assert!(!p.ability_available(Ability::Skip));
        assert!(!p.ability_available(Ability::Block));
    }

    #[test]
    fn test_snapshot_serializes_flat_player_fields() {
        let players = [
            Player::new(&PlayerConfig::new("Ann", "horror", 2)),
            Player::new(&PlayerConfig::new("Bob", "comedy", 2)),
        ];
        let state = MatchState::new(players);
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["players"][0]["name"], "Ann");
        assert_eq!(json["players"][1]["target_genre_count"], 0);
        assert_eq!(json["status"], "not_started");
        assert_eq!(json["turn_count"], 1);
        assert!(json["winner_index"].is_null());
    }
}
