//! Registry of live sessions keyed by id.
//!
//! Sessions are independent: each lives in its own `DashMap` entry and is
//! mutated only while that entry is locked, so commands for one session are
//! serialized while different sessions proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::engine::catalog::CatalogLookup;
use crate::engine::models::MovieSummary;
use crate::game::error::EngineError;
use crate::game::session::{Command, GameSession};
use crate::game::types::{MatchSnapshot, PlayerConfig};

pub type SessionId = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RegistryError {
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::SessionNotFound(_) => "session_not_found",
            RegistryError::Engine(e) => e.kind(),
        }
    }
}

pub struct SessionRegistry {
    sessions: DashMap<SessionId, GameSession>,
    catalog: Arc<dyn CatalogLookup>,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self {
            sessions: DashMap::new(),
            catalog,
        }
    }

    /// Start a match and register it under a fresh id.
    pub fn create(&self, configs: &[PlayerConfig]) -> Result<(SessionId, MatchSnapshot), RegistryError> {
        let session = GameSession::start_match(configs, Arc::clone(&self.catalog))?;
        let snapshot = session.status();
        let id = Uuid::new_v4();
        self.sessions.insert(id, session);
        tracing::info!(session = %id, live = self.sessions.len(), "session created");
        Ok((id, snapshot))
    }

    /// Run `f` with exclusive access to one session.
    pub fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut GameSession) -> R,
    ) -> Result<R, RegistryError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::SessionNotFound(id))?;
        Ok(f(entry.value_mut()))
    }

    /// Execute a command. A session that hits a fatal error is discarded.
    pub fn execute(&self, id: SessionId, command: Command) -> Result<MatchSnapshot, RegistryError> {
        let result = self.with_session(id, |session| session.execute(command))?;
        if let Err(e) = &result {
            if e.is_fatal() {
                self.sessions.remove(&id);
                tracing::warn!(session = %id, error = %e, "session discarded");
            }
        }
        Ok(result?)
    }

    pub fn snapshot(&self, id: SessionId) -> Result<MatchSnapshot, RegistryError> {
        self.with_session(id, |session| session.status())
    }

    pub fn search(&self, id: SessionId, query: &str) -> Result<Vec<MovieSummary>, RegistryError> {
        self.with_session(id, |session| session.search(query))
    }

    pub fn remove(&self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
