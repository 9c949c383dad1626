#![deny(warnings)]

//! Session runtime: owns the firms, drives quarters and admits bots.
//!
//! A [`GameSession`] is the single authority over a market. Wrap it in a
//! [`SharedSession`] to drive it from several threads or a timer task.

pub mod error;
pub mod orchestrator;
pub mod ownership;
pub mod session;
pub mod shared;

pub use error::{SessionError, SessionResult};
pub use orchestrator::{market_shares, QuarterReport};
pub use ownership::{Holding, OwnershipView, Shareholder};
pub use session::{GameSession, RankedEntry};
pub use shared::SharedSession;
