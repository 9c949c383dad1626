//! Who owns whom.

use crate::error::{SessionError, SessionResult};
use crate::session::GameSession;
use serde::{Deserialize, Serialize};
use sim_core::money::round2;
use sim_core::FirmId;
use sim_econ::enterprise_value;

const MAJORITY_PCT: f64 = 51.0;
const BLOCKING_MINORITY_PCT: f64 = 25.0;
const FULL_OWNERSHIP_PCT: f64 = 100.0;

/// A stake this firm holds in another live firm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub firm_id: FirmId,
    pub firm_name: String,
    pub percentage_owned: f64,
    /// Enterprise value of the target times the stake.
    pub stake_value: f64,
    pub is_full_ownership: bool,
    pub is_majority: bool,
    pub is_blocking_minority: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shareholder {
    pub shareholder: String,
    pub percentage: f64,
    pub is_majority_shareholder: bool,
    pub is_blocking_minority: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnershipView {
    pub firm_id: FirmId,
    pub firm_name: String,
    pub is_public: bool,
    pub total_portfolio_value: f64,
    /// Largest stake first.
    pub holdings: Vec<Holding>,
    /// Largest holder first.
    pub shareholders: Vec<Shareholder>,
}

impl GameSession {
    pub fn ownership(&self, id: FirmId) -> SessionResult<OwnershipView> {
        let firm = self.get_firm_by_id(id).ok_or(SessionError::FirmNotFound(id))?;

        let mut holdings: Vec<Holding> = firm
            .portfolio
            .iter()
            .filter_map(|(target_id, &pct)| {
                let target = self.get_firm_by_id(*target_id)?;
                Some(Holding {
                    firm_id: target.id,
                    firm_name: target.name.clone(),
                    percentage_owned: round2(pct),
                    stake_value: round2(enterprise_value(target) * pct / 100.0),
                    is_full_ownership: pct >= FULL_OWNERSHIP_PCT,
                    is_majority: pct >= MAJORITY_PCT,
                    is_blocking_minority: pct >= BLOCKING_MINORITY_PCT,
                })
            })
            .collect();
        holdings.sort_by(|a, b| b.percentage_owned.total_cmp(&a.percentage_owned));

        let mut shareholders: Vec<Shareholder> = firm
            .shares
            .iter()
            .map(|(name, &pct)| Shareholder {
                shareholder: name.clone(),
                percentage: round2(pct),
                is_majority_shareholder: pct >= MAJORITY_PCT,
                is_blocking_minority: pct >= BLOCKING_MINORITY_PCT,
            })
            .collect();
        shareholders.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

        Ok(OwnershipView {
            firm_id: firm.id,
            firm_name: firm.name.clone(),
            is_public: firm.is_public,
            total_portfolio_value: round2(holdings.iter().map(|h| h.stake_value).sum()),
            holdings,
            shareholders,
        })
    }
}
