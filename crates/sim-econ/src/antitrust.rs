//! Merger control and market-dominance enforcement.
//!
//! Two merger checks exist side by side. `MergerCheck::Session` is the check
//! used when a session executes an acquisition: blocked from 50% combined
//! share, flagged from 40%. `MergerCheck::ShareDeal` is the stricter check for
//! share purchases: blocked above 40%, sent to review above 25%.

use serde::{Deserialize, Serialize};
use sim_core::model::FirmId;
use sim_core::params::*;
use sim_core::Firm;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergerCheck {
    Session,
    ShareDeal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Ok,
    Review,
    Warning,
    Blocked,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AntitrustVerdict {
    pub allowed: bool,
    pub reason: String,
    /// Fraction in `[0, 1]`.
    pub combined_share: f64,
    pub risk_level: RiskLevel,
    /// Blocking threshold of the check applied.
    pub threshold: f64,
}

/// Acquirer share plus the acquired slice of the target's share.
pub fn combined_share(acquirer_share: f64, target_share: f64, pct: f64) -> f64 {
    let pct = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
    let a = if acquirer_share.is_finite() { acquirer_share.max(0.0) } else { 0.0 };
    let t = if target_share.is_finite() { target_share.max(0.0) } else { 0.0 };
    a + t * pct / 100.0
}

pub fn check_merger(check: MergerCheck, acquirer_share: f64, target_share: f64, pct: f64) -> AntitrustVerdict {
    let combined = combined_share(acquirer_share, target_share, pct);
    let shown = combined * 100.0;
    let (risk_level, threshold) = match check {
        MergerCheck::Session => {
            let level = if combined >= SESSION_MERGER_BLOCK {
                RiskLevel::Blocked
            } else if combined >= SESSION_MERGER_WARN {
                RiskLevel::Warning
            } else {
                RiskLevel::Ok
            };
            (level, SESSION_MERGER_BLOCK)
        }
        MergerCheck::ShareDeal => {
            let level = if combined > SHARE_DEAL_BLOCK {
                RiskLevel::Blocked
            } else if combined > SHARE_DEAL_REVIEW {
                RiskLevel::Review
            } else {
                RiskLevel::Ok
            };
            (level, SHARE_DEAL_BLOCK)
        }
    };
    let reason = match risk_level {
        RiskLevel::Blocked => format!(
            "market dominance: combined share {shown:.1}% exceeds the {:.0}% limit",
            threshold * 100.0
        ),
        RiskLevel::Warning => format!("critical combined share {shown:.1}%: allowed with conditions"),
        RiskLevel::Review => format!("combined share {shown:.1}% requires a detailed review"),
        RiskLevel::Ok => format!("no concerns: combined share {shown:.1}%"),
    };
    AntitrustVerdict {
        allowed: risk_level != RiskLevel::Blocked,
        reason,
        combined_share: combined,
        risk_level,
        threshold,
    }
}

/// Enforcement tier of a single firm's market share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntitrustTier {
    Clear,
    Approaching,
    Warning,
    Penalty,
    Critical,
}

impl AntitrustTier {
    pub fn from_share(share: f64) -> Self {
        if share >= ANTITRUST_CRITICAL {
            AntitrustTier::Critical
        } else if share >= ANTITRUST_PENALTY {
            AntitrustTier::Penalty
        } else if share >= ANTITRUST_WARNING {
            AntitrustTier::Warning
        } else if share >= ANTITRUST_APPROACHING {
            AntitrustTier::Approaching
        } else {
            AntitrustTier::Clear
        }
    }
}

/// What the competition authority did to one firm this quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnforcementAction {
    pub firm_id: FirmId,
    pub tier: AntitrustTier,
    pub market_share: f64,
    pub fine: f64,
    /// New price after a forced cut.
    pub forced_price: Option<f64>,
    pub divested_capacity: f64,
}

/// Applies the sanctions of the firm's current tier.
///
/// Approaching and warning tiers are notices only. The penalty tier fines a
/// share of revenue and forces a price cut; the critical tier fines more and
/// forces a quarter of committed capacity to be divested.
pub fn enforce(firm: &mut Firm) -> Option<EnforcementAction> {
    if firm.is_bankrupt {
        return None;
    }
    let tier = AntitrustTier::from_share(firm.market_share);
    let mut action = EnforcementAction {
        firm_id: firm.id,
        tier,
        market_share: firm.market_share,
        fine: 0.0,
        forced_price: None,
        divested_capacity: 0.0,
    };
    match tier {
        AntitrustTier::Clear => return None,
        AntitrustTier::Approaching | AntitrustTier::Warning => {}
        AntitrustTier::Penalty => {
            action.fine = firm.revenue.max(0.0) * PENALTY_FINE_RATE;
            let price = (firm.product_price * (1.0 - PENALTY_PRICE_CUT)).max(MIN_PRICE);
            firm.product_price = price;
            action.forced_price = Some(price);
        }
        AntitrustTier::Critical => {
            action.fine = firm.revenue.max(0.0) * CRITICAL_FINE_RATE;
            let divested = firm.production_capacity.max(0.0) * CRITICAL_DIVESTITURE;
            firm.production_capacity -= divested;
            action.divested_capacity = divested;
        }
    }
    firm.cash -= action.fine;
    firm.equity -= action.fine;
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_check_allows_forty_five_percent() {
        let v = check_merger(MergerCheck::Session, 0.25, 0.20, 100.0);
        assert!(v.allowed);
        assert_eq!(v.risk_level, RiskLevel::Warning);
        assert!((v.combined_share - 0.45).abs() < 1e-12);
    }

    #[test]
    fn share_deal_check_blocks_forty_five_percent() {
        let v = check_merger(MergerCheck::ShareDeal, 0.25, 0.20, 100.0);
        assert!(!v.allowed);
        assert!(!v.reason.is_empty());
        assert_eq!(v.risk_level, RiskLevel::Blocked);
    }

    #[test]
    fn thresholds_are_inclusive_and_exclusive_as_named() {
        assert!(!check_merger(MergerCheck::Session, 0.5, 0.0, 100.0).allowed);
        assert!(check_merger(MergerCheck::ShareDeal, 0.4, 0.0, 100.0).allowed);
        assert_eq!(
            check_merger(MergerCheck::ShareDeal, 0.3, 0.0, 100.0).risk_level,
            RiskLevel::Review
        );
        assert_eq!(check_merger(MergerCheck::Session, 0.1, 0.1, 50.0).risk_level, RiskLevel::Ok);
    }

    #[test]
    fn partial_stake_counts_proportionally() {
        assert!((combined_share(0.3, 0.4, 25.0) - 0.4).abs() < 1e-12);
        assert_eq!(combined_share(f64::NAN, 0.2, 100.0), 0.2);
    }

    #[test]
    fn tiers_by_share() {
        assert_eq!(AntitrustTier::from_share(0.1), AntitrustTier::Clear);
        assert_eq!(AntitrustTier::from_share(0.2), AntitrustTier::Approaching);
        assert_eq!(AntitrustTier::from_share(0.27), AntitrustTier::Warning);
        assert_eq!(AntitrustTier::from_share(0.3), AntitrustTier::Penalty);
        assert_eq!(AntitrustTier::from_share(0.9), AntitrustTier::Critical);
    }

    #[test]
    fn penalty_fines_and_cuts_price() {
        let mut firm = Firm::new(FirmId(1), "Acme", "alice");
        firm.market_share = 0.32;
        firm.revenue = 1_000_000.0;
        let action = enforce(&mut firm).unwrap();
        assert_eq!(action.tier, AntitrustTier::Penalty);
        assert!((action.fine - 50_000.0).abs() < 1e-9);
        assert!((firm.product_price - START_PRICE * 0.95).abs() < 1e-9);
        assert!((firm.cash - (START_CASH - 50_000.0)).abs() < 1e-9);
    }

    #[test]
    fn critical_divests_capacity() {
        let mut firm = Firm::new(FirmId(1), "Acme", "alice");
        firm.market_share = 0.45;
        firm.revenue = 2_000_000.0;
        let action = enforce(&mut firm).unwrap();
        assert_eq!(action.divested_capacity, START_CAPACITY * CRITICAL_DIVESTITURE);
        assert_eq!(firm.production_capacity, START_CAPACITY * 0.75);
        assert!((action.fine - 200_000.0).abs() < 1e-9);
    }

    #[test]
    fn small_firms_are_left_alone() {
        let mut firm = Firm::new(FirmId(1), "Acme", "alice");
        firm.market_share = 0.05;
        assert!(enforce(&mut firm).is_none());
        firm.market_share = 0.22;
        let notice = enforce(&mut firm).unwrap();
        assert_eq!(notice.fine, 0.0);
        assert_eq!(firm.cash, START_CASH);
    }
}
