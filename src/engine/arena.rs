//! Bot-vs-bot arena runner.
//!
//! Matches are independent sessions, so they run in parallel on the rayon
//! pool. Each match gets its own seeded RNG, which keeps results reproducible
//! for a given base seed regardless of scheduling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::engine::bot_strategy::{BotAction, BotStrategy};
use crate::engine::catalog::CatalogLookup;
use crate::engine::config::MatchDefaults;
use crate::game::error::EngineError;
use crate::game::session::GameSession;
use crate::game::types::MatchStatus;

/// Upper bound on bot steps in a single match.
const MAX_ACTIONS: usize = 5_000;
/// Full turns in a row without any selection before the match counts as stalled.
const MAX_IDLE_TURNS: usize = 4;

/// Aggregated results from an arena run.
pub struct ArenaResult {
    pub num_games: usize,
    pub wins: HashMap<String, usize>,
    pub draws: usize,
    pub aborted: usize,
    pub turn_counts: Vec<u32>,
    pub game_durations_ms: Vec<f64>,
}

impl ArenaResult {
    pub fn win_rate(&self, name: &str) -> f64 {
        *self.wins.get(name).unwrap_or(&0) as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_turns(&self) -> f64 {
        if self.turn_counts.is_empty() {
            return 0.0;
        }
        self.turn_counts.iter().map(|t| f64::from(*t)).sum::<f64>() / self.turn_counts.len() as f64
    }

    /// Wilson score interval for the win rate.
    pub fn confidence_interval_95(&self, name: &str) -> (f64, f64) {
        let n = self.num_games;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate(name);
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Arena Results ({} games)", self.num_games)];
        lines.push("=".repeat(60));
        let mut names: Vec<&String> = self.wins.keys().collect();
        names.sort();
        for name in names {
            let wr = self.win_rate(name);
            let (ci_lo, ci_hi) = self.confidence_interval_95(name);
            lines.push(format!(
                "  {:>12}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]",
                name,
                self.wins[name],
                wr * 100.0,
                ci_lo * 100.0,
                ci_hi * 100.0,
            ));
        }
        lines.push(format!("  {:>12}: {}", "Draws", self.draws));
        if self.aborted > 0 {
            lines.push(format!("  {:>12}: {}", "Aborted", self.aborted));
        }
        lines.push(format!("  Avg turns: {:.1}", self.avg_turns()));
        if !self.game_durations_ms.is_empty() {
            let avg_ms = self.game_durations_ms.iter().sum::<f64>() / self.game_durations_ms.len() as f64;
            let total_s = self.game_durations_ms.iter().sum::<f64>() / 1000.0;
            lines.push(format!("  Avg game: {:.2}ms  |  Total: {:.2}s", avg_ms, total_s));
        }
        lines.join("\n")
    }
}

/// How one arena match ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    /// Strategy name of the winner; `None` for a stalled match.
    pub winner: Option<String>,
    pub turns: u32,
}

/// Play one match between two seated strategies.
pub fn play_one_game(
    catalog: Arc<dyn CatalogLookup>,
    seats: [(&str, &dyn BotStrategy); 2],
    defaults: &MatchDefaults,
    seed: u64,
) -> Result<GameOutcome, EngineError> {
    let configs = defaults.player_configs(seats[0].0, seats[1].0);
    let mut session = GameSession::start_match(&configs, catalog)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut idle_turns = 0;
    let mut selected_this_turn = false;
    for _ in 0..MAX_ACTIONS {
        let state = session.state();
        if state.status == MatchStatus::Finished {
            break;
        }
        let (_, strategy) = seats[state.current_player_index];

        // A rejected step forfeits the rest of the turn.
        let keep_turn = match strategy.choose_action(&session, &mut rng) {
            BotAction::Select(movie_id) => match session.select_movie(movie_id) {
                Ok(_) => {
                    selected_this_turn = true;
                    true
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => false,
            },
            BotAction::UseAbility(ability) => match session.use_ability(ability) {
                Ok(_) => true,
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => false,
            },
            BotAction::Pass => false,
        };
        if keep_turn {
            continue;
        }

        idle_turns = if selected_this_turn { 0 } else { idle_turns + 1 };
        selected_this_turn = false;
        if idle_turns >= MAX_IDLE_TURNS {
            tracing::debug!(seed, "arena match stalled");
            break;
        }
        session.advance_turn()?;
    }

    let snapshot = session.status();
    Ok(GameOutcome {
        winner: snapshot.winner_name().map(str::to_string),
        turns: snapshot.turn_count,
    })
}

/// Run `num_games` between exactly two named strategies and aggregate.
pub fn run_arena(
    catalog: Arc<dyn CatalogLookup>,
    strategies: &HashMap<String, Box<dyn BotStrategy>>,
    num_games: usize,
    base_seed: u64,
    defaults: &MatchDefaults,
    alternate_seats: bool,
    progress_callback: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> ArenaResult {
    let mut names: Vec<String> = strategies.keys().cloned().collect();
    names.sort();

    let mut result = ArenaResult {
        num_games,
        wins: names.iter().map(|n| (n.clone(), 0)).collect(),
        draws: 0,
        aborted: 0,
        turn_counts: Vec::with_capacity(num_games),
        game_durations_ms: Vec::with_capacity(num_games),
    };
    if names.len() != 2 {
        tracing::warn!(strategies = names.len(), "arena needs exactly two strategies");
        result.aborted = num_games;
        return result;
    }

    let completed = AtomicUsize::new(0);
    let outcomes: Vec<(Result<GameOutcome, EngineError>, f64)> = (0..num_games)
        .into_par_iter()
        .map(|game_idx| {
            let (first, second) = if alternate_seats && game_idx % 2 == 1 {
                (&names[1], &names[0])
            } else {
                (&names[0], &names[1])
            };
            let seats = [
                (first.as_str(), strategies[first].as_ref()),
                (second.as_str(), strategies[second].as_ref()),
            ];

            let t0 = Instant::now();
            let outcome = play_one_game(
                Arc::clone(&catalog),
                seats,
                defaults,
                base_seed.wrapping_add(game_idx as u64),
            );
            let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(cb) = progress_callback {
                cb(done, num_games);
            }
            (outcome, elapsed_ms)
        })
        .collect();

    for (outcome, elapsed_ms) in outcomes {
        result.game_durations_ms.push(elapsed_ms);
        match outcome {
            Ok(GameOutcome { winner: Some(name), turns }) => {
                *result.wins.entry(name).or_insert(0) += 1;
                result.turn_counts.push(turns);
            }
            Ok(GameOutcome { winner: None, turns }) => {
                result.draws += 1;
                result.turn_counts.push(turns);
            }
            Err(e) => {
                tracing::warn!(error = %e, "arena match aborted");
                result.aborted += 1;
            }
        }
    }
    result
}
