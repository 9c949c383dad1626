//! Thread-safe handle to one session.

use crate::error::{SessionError, SessionResult};
use crate::orchestrator::QuarterReport;
use crate::session::GameSession;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// Cloneable handle; every mutation goes through the single writer lock.
#[derive(Clone, Debug, Default)]
pub struct SharedSession(Arc<RwLock<GameSession>>);

impl SharedSession {
    pub fn new(session: GameSession) -> Self {
        Self(Arc::new(RwLock::new(session)))
    }

    pub fn read<T>(&self, f: impl FnOnce(&GameSession) -> T) -> SessionResult<T> {
        let guard = self.0.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(f(&guard))
    }

    pub fn write<T>(&self, f: impl FnOnce(&mut GameSession) -> T) -> SessionResult<T> {
        let mut guard = self.0.write().map_err(|_| SessionError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    /// Advances the quarter if the session is running and the quarter's time
    /// is up. Check and advance happen under one write lock.
    pub fn tick(&self, now: DateTime<Utc>) -> SessionResult<Option<QuarterReport>> {
        self.write(|s| (s.is_active() && s.should_advance_quarter(now)).then(|| s.advance_quarter()))
    }
}
