#![deny(warnings)]

//! Economics of the simulation: everything that happens to one firm, or
//! between two firms, in a quarter.
//!
//! - [`ledger`]: quarterly results (demand, costs, profit chain, ratios, state advance)
//! - [`decisions`]: decision validator
//! - [`financing`], [`operations`]: loans, equity, plant, personnel, innovation
//! - [`valuation`], [`antitrust`], [`mna`]: pricing and executing acquisitions
//! - [`bankruptcy`]: liquidation waterfall

pub mod antitrust;
pub mod bankruptcy;
pub mod costs;
pub mod decisions;
pub mod demand;
pub mod financing;
pub mod ledger;
pub mod mna;
pub mod operations;
pub mod ratios;
pub mod valuation;

pub use antitrust::{check_merger, AntitrustTier, AntitrustVerdict, EnforcementAction, MergerCheck, RiskLevel};
pub use decisions::{apply_decisions, DecisionBundle, DepreciationOverrides};
pub use ledger::calculate_quarterly_results;
pub use mna::{acquire, AcquisitionError, AcquisitionOutcome, DealKind};
pub use valuation::{acquisition_price, enterprise_value};
