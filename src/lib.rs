//! Two-player movie connection game engine.
//!
//! `game` holds the rules: session lifecycle, turn flow, movie validation,
//! the skip/block abilities and win detection. `engine` holds everything
//! around them: the movie catalog, configuration, the session registry,
//! the JSON-line driver, and bots for the arena.

pub mod engine;
pub mod game;
