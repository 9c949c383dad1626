//! Session-level errors.

use sim_core::{BusinessError, FirmId, ValidationError};
use sim_econ::AcquisitionError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// No live firm carries this id.
    #[error("firm {0} not found")]
    FirmNotFound(FirmId),
    /// The user already belongs to a firm.
    #[error("user '{0}' is already registered with a firm")]
    UserTaken(String),
    /// Cap tables name holding firms, so firm names stay unique.
    #[error("firm name '{0}' is already taken")]
    NameTaken(String),
    #[error("firm {0} is bankrupt")]
    FirmBankrupt(FirmId),
    /// Another thread panicked while holding the session lock.
    #[error("session lock poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Business(#[from] BusinessError),
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    /// Rejected input such as an empty firm name or a bad config.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

pub type SessionResult<T> = Result<T, SessionError>;
