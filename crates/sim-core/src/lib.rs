#![deny(warnings)]

//! Core domain model for the quarterly business simulation.
//!
//! This crate holds the firm record and its value types, the engine
//! parameters, session configuration, the capacity model and the wire
//! snapshots consumed by the API and dashboard. It performs no economics of
//! its own beyond the invariants a firm must satisfy.

pub mod capacity;
pub mod config;
pub mod error;
pub mod firm;
pub mod model;
pub mod money;
pub mod params;
pub mod snapshot;

pub use config::SimConfig;
pub use error::{BusinessError, ValidationError};
pub use firm::{validate_firm, Firm};
pub use model::*;
pub use snapshot::{BalanceSheet, FirmListing, FirmSnapshot, MarketEntry};
