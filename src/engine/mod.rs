pub mod models;
pub mod catalog;
pub mod config;
pub mod registry;
pub mod driver;
pub mod bot_strategy;
pub mod arena;
