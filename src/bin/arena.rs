//! Arena CLI: run bot-vs-bot matches over a movie catalog.
//!
//! Usage:
//!   cargo run --release --bin arena -- --catalog data/movies.json --games 200
//!   cargo run --release --bin arena -- --p1-profile greedy --p2-profile chaotic --games 100

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use cinelink_engine::engine::arena::run_arena;
use cinelink_engine::engine::bot_strategy::{build_strategy, BotStrategy};
use cinelink_engine::engine::catalog::{CatalogLookup, InMemoryCatalog};
use cinelink_engine::engine::config::{load_config, load_default_config, BotProfile, EngineConfig};

#[derive(Parser)]
#[command(name = "arena", about = "Run bot-vs-bot arena experiments for the movie connection game")]
struct Cli {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    games: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Alternate seat positions between games
    #[arg(long, default_value = "true")]
    alternate_seats: bool,

    /// Path to engine.toml
    #[arg(long, env = "CINELINK_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the movie catalog JSON (overrides engine.toml)
    #[arg(long, env = "CINELINK_CATALOG")]
    catalog: Option<PathBuf>,

    /// Win threshold for both seats (overrides engine.toml)
    #[arg(long)]
    threshold: Option<i64>,

    // --- Player 1 ---
    /// P1 display name
    #[arg(long, default_value = "p1")]
    p1_name: String,

    /// P1 profile name (from engine.toml)
    #[arg(long)]
    p1_profile: Option<String>,

    /// P1 strategy type: "greedy" or "random"
    #[arg(long, default_value = "greedy")]
    p1_type: String,

    /// P1 chance of using its ability when available
    #[arg(long)]
    p1_ability_chance: Option<f64>,

    // --- Player 2 ---
    /// P2 display name
    #[arg(long, default_value = "p2")]
    p2_name: String,

    /// P2 profile name (from engine.toml)
    #[arg(long)]
    p2_profile: Option<String>,

    /// P2 strategy type: "greedy" or "random"
    #[arg(long, default_value = "random")]
    p2_type: String,

    /// P2 chance of using its ability when available
    #[arg(long)]
    p2_ability_chance: Option<f64>,
}

struct SeatConfig {
    name: String,
    profile: BotProfile,
}

fn build_seat_config(
    name: &str,
    profile_name: Option<&str>,
    strategy_type: &str,
    ability_chance: Option<f64>,
    config: &EngineConfig,
) -> SeatConfig {
    if let Some(prof_name) = profile_name {
        let mut profile = config.profile(prof_name).cloned().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available profiles: {:?}", config.profiles.keys().collect::<Vec<_>>());
            std::process::exit(1);
        });
        if let Some(v) = ability_chance {
            profile.ability_chance = Some(v);
        }
        let display_name = if name == "p1" || name == "p2" {
            prof_name.to_string()
        } else {
            name.to_string()
        };
        return SeatConfig { name: display_name, profile };
    }

    SeatConfig {
        name: name.to_string(),
        profile: BotProfile {
            description: None,
            strategy_type: strategy_type.to_string(),
            ability_chance,
        },
    }
}

fn print_config(label: &str, seat: &SeatConfig) {
    eprintln!(
        "  {}: type={}, ability_chance={:.2}{}",
        label,
        seat.profile.strategy_type,
        seat.profile.effective_ability_chance(),
        seat.profile
            .description
            .as_deref()
            .map(|d| format!(" ({})", d))
            .unwrap_or_default(),
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }),
        None => load_default_config(),
    };

    let Some(catalog_path) = cli.catalog.clone().or_else(|| config.catalog.clone()) else {
        eprintln!("Error: no catalog given (use --catalog or set `catalog` in engine.toml)");
        std::process::exit(1);
    };
    let catalog: Arc<dyn CatalogLookup> = match InMemoryCatalog::load(&catalog_path) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            std::process::exit(1);
        }
    };

    let mut defaults = config.match_defaults.clone();
    if let Some(t) = cli.threshold {
        defaults.win_threshold = t;
    }

    let p1 = build_seat_config(
        &cli.p1_name, cli.p1_profile.as_deref(), &cli.p1_type, cli.p1_ability_chance, &config,
    );
    let p2 = build_seat_config(
        &cli.p2_name, cli.p2_profile.as_deref(), &cli.p2_type, cli.p2_ability_chance, &config,
    );
    if p1.name == p2.name {
        eprintln!("Error: both seats are named '{}'; pass --p1-name/--p2-name", p1.name);
        std::process::exit(1);
    }

    eprintln!("Arena: {} games, seed={}, alternate_seats={}", cli.games, cli.seed, cli.alternate_seats);
    eprintln!(
        "  match: threshold={}, genres={} vs {}",
        defaults.win_threshold, defaults.p1_genre, defaults.p2_genre
    );
    print_config(&p1.name, &p1);
    print_config(&p2.name, &p2);
    eprintln!();

    let mut strategies: HashMap<String, Box<dyn BotStrategy>> = HashMap::new();
    for seat in [&p1, &p2] {
        let strategy = build_strategy(&seat.profile).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        strategies.insert(seat.name.clone(), strategy);
    }

    let progress_cb = |done: usize, total: usize| {
        eprint!("\r  [{}/{}] games completed", done, total);
    };

    let result = run_arena(
        catalog,
        &strategies,
        cli.games,
        cli.seed,
        &defaults,
        cli.alternate_seats,
        Some(&progress_cb),
    );

    eprintln!("\r                                    ");
    println!("{}", result.summary());
}
