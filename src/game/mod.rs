//! The movie-connection game: rules, state and the session aggregate.

pub mod connectivity;
pub mod error;
pub mod moves;
pub mod powerups;
pub mod session;
pub mod turn;
pub mod types;
pub mod win;

pub use connectivity::{are_connected, shared_people, Link, PersonRole};
pub use error::EngineError;
pub use session::{Command, GameSession};
pub use types::{Ability, MatchEvent, MatchSnapshot, MatchState, MatchStatus, Player, PlayerConfig};
