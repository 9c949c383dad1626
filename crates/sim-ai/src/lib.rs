#![deny(warnings)]

//! Bot players.
//!
//! Bots pick a strategy from their own market position and finances, then
//! sample next quarter's decisions inside that strategy's ranges. All
//! randomness comes from the caller's RNG so a seeded session replays exactly.

pub mod names;
pub mod strategy;

pub use names::{bot_profile, BotProfile};
pub use strategy::{
    decide, execute, select_strategy, BotConfig, BotDecision, MarketStats, SecondaryAction, Strategy,
    StrategyRanges,
};
