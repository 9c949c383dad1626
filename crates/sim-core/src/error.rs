use crate::model::{MachineClass, Qualification};
use thiserror::Error;

/// Validation errors for domain invariants and configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite numeric value in {0}")]
    NonFinite(&'static str),
    /// Money amount that must not be negative.
    #[error("negative monetary value in {0}")]
    NegativeMoney(&'static str),
    /// Value outside its permitted band.
    #[error("{field} must be within [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    /// Display names must contain something other than whitespace.
    #[error("name must not be empty")]
    EmptyName,
    /// Shareholdings exceed the whole firm.
    #[error("shareholdings sum to {0:.2}%, expected at most 100%")]
    SharesOverAllocated(f64),
    /// Committed production above what machines and staff can deliver.
    #[error("committed capacity {committed:.0} exceeds ceiling {ceiling:.0}")]
    CapacityAboveCeiling { committed: f64, ceiling: f64 },
}

/// Business-rule failures reported back to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BusinessError {
    #[error("insufficient cash: need €{needed:.0}, available €{available:.0}")]
    InsufficientCash { needed: f64, available: f64 },
    #[error("amount must be positive and finite")]
    InvalidAmount,
    #[error("unknown qualification: {0}")]
    InvalidQualification(String),
    #[error("only {available} {qualification} employees, cannot release {requested}")]
    InsufficientPersonnel {
        qualification: Qualification,
        requested: u32,
        available: u32,
    },
    #[error("unknown machine class: {0}")]
    InvalidMachineClass(String),
    #[error("machines are already at the highest class")]
    MachinesAtMaximum,
    #[error("cannot upgrade machines from {from} to {to}")]
    UpgradeNotAllowed { from: MachineClass, to: MachineClass },
    #[error("loan term must be between 1 and {max} quarters, got {got}")]
    InvalidLoanTerm { got: u32, max: u32 },
    #[error("credit limit exceeded: requested €{requested:.0}, available €{available:.0}")]
    CreditLimitExceeded { requested: f64, available: f64 },
    #[error("only {available:.2}% of the shares can be transferred, requested {requested:.2}%")]
    InsufficientShares { requested: f64, available: f64 },
    #[error("share issue would raise the public float to {0:.1}%")]
    FloatLimitExceeded(f64),
    #[error("firm is not publicly listed")]
    NotPublic,
    #[error("firm is bankrupt")]
    Bankrupt,
}
