//! Names and starting profiles for generated bot firms.

use rand::seq::SliceRandom;
use rand::Rng;
use sim_core::params::BOT_MARKER;

pub const NAME_PREFIXES: [&str; 10] = [
    "Tech", "Innovation", "Global", "Market", "Digital", "Smart", "Future", "Quantum", "Cyber", "Mega",
];

pub const NAME_SUFFIXES: [&str; 10] = [
    "Corp", "Industries", "Systems", "Solutions", "Dynamics", "Ventures", "Labs", "Group", "Partners", "Innovations",
];

/// Personas shown as the bot's user name.
pub const PERSONAS: [&str; 5] = ["Conservative", "Aggressive", "Balanced", "Risk-Taker", "Cautious"];

/// Identity and opening decisions of a freshly generated bot.
#[derive(Clone, Debug, PartialEq)]
pub struct BotProfile {
    pub name: String,
    pub user: String,
    pub marketing: f64,
    pub quality: i32,
}

/// `ordinal` is 1-based and keeps names unique within a session.
pub fn bot_profile<R: Rng>(rng: &mut R, ordinal: u32) -> BotProfile {
    let prefix = NAME_PREFIXES.choose(rng).copied().unwrap_or("Tech");
    let suffix = NAME_SUFFIXES.choose(rng).copied().unwrap_or("Corp");
    let persona = PERSONAS.choose(rng).copied().unwrap_or("Balanced");
    BotProfile {
        name: format!("{prefix}{suffix}_AI_{ordinal}"),
        user: format!("{persona} {BOT_MARKER}"),
        marketing: rng.gen_range(20_000..=50_000) as f64,
        quality: rng.gen_range(4..=7),
    }
}
