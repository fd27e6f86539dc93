//! Error taxonomy for match commands.

use crate::engine::models::MovieId;

/// Why a command was rejected.
///
/// Every variant except `InvariantViolation` is recoverable: the match state is
/// untouched and the caller may issue another command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid match configuration: {0}")]
    InvalidConfig(String),

    #[error("match is not in progress")]
    SessionNotActive,

    #[error("action not allowed: {0}")]
    ActionNotAllowed(String),

    #[error("movie {0} not found in catalog")]
    MovieNotFound(MovieId),

    #[error("movie {0} has already been played")]
    MovieAlreadyUsed(MovieId),

    #[error("movie {to} shares no cast or crew with movie {from}")]
    NotConnected { from: MovieId, to: MovieId },

    #[error("ability already used this match")]
    AbilityAlreadyUsed,

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    /// Stable identifier for the shim layer to key messages on.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidConfig(_) => "invalid_config",
            EngineError::SessionNotActive => "session_not_active",
            EngineError::ActionNotAllowed(_) => "action_not_allowed",
            EngineError::MovieNotFound(_) => "movie_not_found",
            EngineError::MovieAlreadyUsed(_) => "movie_already_used",
            EngineError::NotConnected { .. } => "not_connected",
            EngineError::AbilityAlreadyUsed => "ability_already_used",
            EngineError::InvariantViolation(_) => "invariant_violation",
        }
    }

    /// The session must be discarded after a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::InvariantViolation(_))
    }
}
