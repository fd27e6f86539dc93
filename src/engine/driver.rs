//! JSON-line command driver over a `SessionRegistry`.
//!
//! One request per line, one response per line. Requests carry a `command`
//! tag; everything except `start_match` names a `session`:
//!
//! ```text
//! {"command": "start_match", "players": [{"name": "Ann", "target_genre": "horror", "win_threshold": 3}, ...]}
//! {"command": "search", "session": "<uuid>", "query": "alien"}
//! {"command": "select_movie", "session": "<uuid>", "movie_id": 348}
//! {"command": "advance_turn", "session": "<uuid>"}
//! ```

use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::config::MatchDefaults;
use crate::engine::registry::{RegistryError, SessionId, SessionRegistry};
use crate::game::session::Command;
use crate::game::types::PlayerConfig;

/// Requests handled by the driver itself rather than a session.
#[derive(Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum ControlRequest {
    StartMatch {
        #[serde(default)]
        players: Vec<PlayerConfig>,
    },
    Search {
        session: SessionId,
        #[serde(default)]
        query: String,
    },
    EndMatch {
        session: SessionId,
    },
}

#[derive(Deserialize)]
struct SessionRequest {
    session: SessionId,
}

pub struct CommandDriver {
    registry: SessionRegistry,
    defaults: MatchDefaults,
}

impl CommandDriver {
    pub fn new(registry: SessionRegistry, defaults: MatchDefaults) -> Self {
        Self { registry, defaults }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handle one request line and produce the response value.
    pub fn handle_line(&self, line: &str) -> Value {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => return error_response("bad_request", &format!("invalid JSON: {}", e)),
        };

        let command = request.get("command").and_then(Value::as_str).unwrap_or_default();
        match command {
            "start_match" | "search" | "end_match" => self.handle_control(request),
            _ => self.handle_session(request),
        }
    }

    fn handle_control(&self, request: Value) -> Value {
        let control: ControlRequest = match serde_json::from_value(request) {
            Ok(c) => c,
            Err(e) => return error_response("bad_request", &e.to_string()),
        };
        match control {
            ControlRequest::StartMatch { players } => {
                let players = if players.is_empty() {
                    self.defaults.player_configs("Player1", "Player2")
                } else {
                    players
                };
                match self.registry.create(&players) {
                    Ok((id, snapshot)) => json!({ "ok": true, "session": id, "snapshot": snapshot }),
                    Err(e) => registry_error(&e),
                }
            }
            ControlRequest::Search { session, query } => match self.registry.search(session, &query) {
                Ok(movies) => json!({ "ok": true, "session": session, "movies": movies }),
                Err(e) => registry_error(&e),
            },
            ControlRequest::EndMatch { session } => {
                if self.registry.remove(session) {
                    json!({ "ok": true, "session": session })
                } else {
                    registry_error(&RegistryError::SessionNotFound(session))
                }
            }
        }
    }

    fn handle_session(&self, request: Value) -> Value {
        let target: SessionRequest = match serde_json::from_value(request.clone()) {
            Ok(t) => t,
            Err(e) => return error_response("bad_request", &e.to_string()),
        };
        let command: Command = match serde_json::from_value(request) {
            Ok(c) => c,
            Err(e) => return error_response("bad_request", &e.to_string()),
        };
        match self.registry.execute(target.session, command) {
            Ok(snapshot) => json!({ "ok": true, "session": target.session, "snapshot": snapshot }),
            Err(e) => registry_error(&e),
        }
    }
}

fn registry_error(e: &RegistryError) -> Value {
    error_response(e.kind(), &e.to_string())
}

fn error_response(kind: &str, message: &str) -> Value {
    json!({ "ok": false, "error": { "kind": kind, "message": message } })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::catalog::InMemoryCatalog;

    fn driver() -> CommandDriver {
        let catalog = InMemoryCatalog::from_json_str(
            r#"[
                {"id": 1, "title": "Alien", "release_year": 1979, "genres": ["Sci-Fi", "Horror"],
                 "cast": [{"id": 100, "name": "Sigourney Weaver"}]},
                {"id": 2, "title": "Aliens", "release_year": 1986, "genres": ["Action", "Sci-Fi"],
                 "cast": [{"id": 100, "name": "Sigourney Weaver"}]},
                {"id": 3, "title": "Heat", "release_year": 1995, "genres": ["Crime"],
                 "cast": [{"id": 200, "name": "Al Pacino"}]}
            ]"#,
        )
        .unwrap();
        CommandDriver::new(SessionRegistry::new(Arc::new(catalog)), MatchDefaults::default())
    }

    fn start(d: &CommandDriver) -> String {
        let resp = d.handle_line(r#"{"command": "start_match"}"#);
        assert_eq!(resp["ok"], true);
        resp["session"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_start_with_defaults() {
        let d = driver();
        let resp = d.handle_line(r#"{"command": "start_match"}"#);
        assert_eq!(resp["snapshot"]["players"][0]["name"], "Player1");
        assert_eq!(resp["snapshot"]["players"][0]["target_genre"], "science fiction");
        assert_eq!(resp["snapshot"]["status"], "in_progress");
    }

    #[test]
    fn test_invalid_config_reported() {
        let d = driver();
        let resp = d.handle_line(
            r#"{"command": "start_match", "players": [
                {"name": "Ann", "target_genre": "horror", "win_threshold": 0},
                {"name": "Bob", "target_genre": "crime", "win_threshold": 2}]}"#,
        );
        assert_eq!(resp["ok"], false);
        assert_eq!(resp["error"]["kind"], "invalid_config");
    }

    #[test]
    fn test_play_through_lines() {
        let d = driver();
        let id = start(&d);

        let resp = d.handle_line(&format!(r#"{{"command": "search", "session": "{}", "query": "ali"}}"#, id));
        assert_eq!(resp["movies"].as_array().unwrap().len(), 2);

        let resp = d.handle_line(&format!(r#"{{"command": "select_movie", "session": "{}", "movie_id": 1}}"#, id));
        assert_eq!(resp["ok"], true);
        assert_eq!(resp["snapshot"]["last_movie"]["title"], "Alien");

        let resp = d.handle_line(&format!(r#"{{"command": "advance_turn", "session": "{}"}}"#, id));
        assert_eq!(resp["snapshot"]["current_player_index"], 1);

        let resp = d.handle_line(&format!(r#"{{"command": "select_movie", "session": "{}", "movie_id": 3}}"#, id));
        assert_eq!(resp["error"]["kind"], "not_connected");

        let resp = d.handle_line(&format!(r#"{{"command": "end_match", "session": "{}"}}"#, id));
        assert_eq!(resp["ok"], true);
        assert!(d.registry().is_empty());
    }

    #[test]
    fn test_bad_requests() {
        let d = driver();
        assert_eq!(d.handle_line("not json")["error"]["kind"], "bad_request");
        assert_eq!(d.handle_line(r#"{"command": "use_skip"}"#)["error"]["kind"], "bad_request");
        let id = start(&d);
        let resp = d.handle_line(&format!(r#"{{"command": "fly", "session": "{}"}}"#, id));
        assert_eq!(resp["error"]["kind"], "bad_request");
        let resp = d.handle_line(
            r#"{"command": "get_status", "session": "00000000-0000-0000-0000-000000000000"}"#,
        );
        assert_eq!(resp["error"]["kind"], "session_not_found");
    }
}
