//! Acquisition transactions between two firm records.
//!
//! `acquire` takes both firms mutably and either applies the whole deal or
//! returns an error with neither firm changed. A full deal (at least 99.9%)
//! is an asset deal: inventory, plant, capacity and staff move to the
//! acquirer, the target's debt does not, and the caller removes the emptied
//! target. A partial deal moves a proportional slice and leaves the target
//! alive with most of the price as fresh cash. A purchase that lifts an
//! existing stake to the whole firm completes as a full deal and pays only for
//! the shares still outstanding.

use crate::antitrust::{check_merger, AntitrustVerdict, MergerCheck};
use crate::valuation::acquisition_price;
use serde::{Deserialize, Serialize};
use sim_core::model::{FirmId, FixedAssets, Workforce};
use sim_core::params::{FULL_ACQUISITION_PCT, MATERIAL_COST_PER_UNIT, PARTIAL_DEAL_TARGET_SHARE};
use sim_core::{BusinessError, Firm};
use thiserror::Error;
use tracing::info;

const STAKE_TOLERANCE: f64 = 1e-6;

/// Reasons an acquisition cannot go ahead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcquisitionError {
    /// A firm cannot buy itself.
    #[error("a firm cannot acquire itself")]
    SelfAcquisition,
    /// Percentage outside `[1, 100]`.
    #[error("percentage must be between 1 and 100, got {0}")]
    InvalidPercentage(f64),
    #[error("target firm is bankrupt")]
    TargetBankrupt,
    #[error("acquiring firm is bankrupt")]
    AcquirerBankrupt,
    /// The competition check refused the deal.
    #[error("blocked by the competition authority: {0}")]
    AntitrustBlocked(String),
    #[error("insufficient cash: need €{needed:.0}, available €{available:.0}")]
    InsufficientCash { needed: f64, available: f64 },
    /// Share register rejected the transfer.
    #[error(transparent)]
    Shares(#[from] BusinessError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealKind {
    Full,
    Partial,
}

/// Everything that moved in a completed acquisition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionOutcome {
    pub kind: DealKind,
    pub acquirer_id: FirmId,
    pub target_id: FirmId,
    pub target_name: String,
    pub percentage: f64,
    pub price: f64,
    pub verdict: AntitrustVerdict,
    pub inventory_transferred: f64,
    pub capacity_transferred: f64,
    pub assets_transferred: FixedAssets,
    pub personnel_transferred: Workforce,
    /// Price above the book equity acquired.
    pub goodwill: f64,
    /// Cash received by the target (partial deals only).
    pub target_proceeds: f64,
}

fn slice_workforce(w: &Workforce, fraction: f64) -> Workforce {
    let part = |n: u32| ((n as f64) * fraction).floor() as u32;
    Workforce::new(part(w.unskilled), part(w.semi_skilled), part(w.skilled))
}

fn add_workforce(into: &mut Workforce, other: &Workforce) {
    into.unskilled = into.unskilled.saturating_add(other.unskilled);
    into.semi_skilled = into.semi_skilled.saturating_add(other.semi_skilled);
    into.skilled = into.skilled.saturating_add(other.skilled);
}

fn add_assets(into: &mut FixedAssets, other: &FixedAssets) {
    into.buildings += other.buildings;
    into.machines += other.machines;
    into.equipment += other.equipment;
}

/// Terms of a deal that passed every precondition.
#[derive(Clone, Debug, PartialEq)]
pub struct DealTerms {
    pub kind: DealKind,
    /// Percent changing hands, never more than the acquirer does not own yet.
    pub stake: f64,
    pub price: f64,
    pub verdict: AntitrustVerdict,
}

/// Checks every precondition without changing either firm.
pub fn evaluate(acquirer: &Firm, target: &Firm, pct: f64, check: MergerCheck) -> Result<DealTerms, AcquisitionError> {
    if acquirer.id == target.id {
        return Err(AcquisitionError::SelfAcquisition);
    }
    if !(pct.is_finite() && (1.0..=100.0).contains(&pct)) {
        return Err(AcquisitionError::InvalidPercentage(pct));
    }
    if acquirer.is_bankrupt {
        return Err(AcquisitionError::AcquirerBankrupt);
    }
    if target.is_bankrupt {
        return Err(AcquisitionError::TargetBankrupt);
    }
    let verdict = check_merger(check, acquirer.market_share, target.market_share, pct);
    if !verdict.allowed {
        return Err(AcquisitionError::AntitrustBlocked(verdict.reason));
    }
    let owned = acquirer.portfolio.get(&target.id).copied().unwrap_or(0.0);
    let outstanding = (100.0 - owned).max(0.0);
    let (kind, stake) = if pct >= FULL_ACQUISITION_PCT {
        (DealKind::Full, outstanding)
    } else if owned + pct >= FULL_ACQUISITION_PCT {
        if pct > outstanding + STAKE_TOLERANCE {
            return Err(BusinessError::InsufficientShares {
                requested: pct,
                available: outstanding,
            }
            .into());
        }
        (DealKind::Full, pct.min(outstanding))
    } else {
        (DealKind::Partial, pct)
    };
    let price = acquisition_price(target, stake);
    if acquirer.cash < price {
        return Err(AcquisitionError::InsufficientCash {
            needed: price,
            available: acquirer.cash,
        });
    }
    Ok(DealTerms {
        kind,
        stake,
        price,
        verdict,
    })
}

/// Executes an acquisition of `pct` percent of `target`.
pub fn acquire(
    acquirer: &mut Firm,
    target: &mut Firm,
    pct: f64,
    check: MergerCheck,
) -> Result<AcquisitionOutcome, AcquisitionError> {
    let DealTerms {
        kind,
        stake,
        price,
        verdict,
    } = evaluate(acquirer, target, pct, check)?;
    let outcome = match kind {
        DealKind::Full => full_deal(acquirer, target, stake, price, verdict),
        DealKind::Partial => partial_deal(acquirer, target, stake, price, verdict)?,
    };
    info!(
        acquirer = %outcome.acquirer_id,
        target = %outcome.target_id,
        stake,
        price,
        kind = ?outcome.kind,
        "acquisition completed"
    );
    Ok(outcome)
}

fn full_deal(
    acquirer: &mut Firm,
    target: &mut Firm,
    pct: f64,
    price: f64,
    verdict: AntitrustVerdict,
) -> AcquisitionOutcome {
    let assets = target.assets;
    let inventory = target.inventory_level.max(0.0);
    let capacity = target.production_capacity.max(0.0);
    let personnel = target.workforce;
    let net_asset_value = assets.total() + inventory * MATERIAL_COST_PER_UNIT;
    let goodwill = price - target.equity * pct / 100.0;

    acquirer.cash -= price;
    acquirer.equity += net_asset_value - price;
    add_assets(&mut acquirer.assets, &assets);
    acquirer.inventory_level += inventory;
    add_workforce(&mut acquirer.workforce, &personnel);
    acquirer.production_capacity += capacity;
    acquirer.clamp_capacity_to_ceiling();
    acquirer.portfolio.remove(&target.id);

    target.assets = FixedAssets::default();
    target.inventory_level = 0.0;
    target.production_capacity = 0.0;
    target.workforce = Workforce::default();

    AcquisitionOutcome {
        kind: DealKind::Full,
        acquirer_id: acquirer.id,
        target_id: target.id,
        target_name: target.name.clone(),
        percentage: pct,
        price,
        verdict,
        inventory_transferred: inventory,
        capacity_transferred: capacity,
        assets_transferred: assets,
        personnel_transferred: personnel,
        goodwill,
        target_proceeds: 0.0,
    }
}

fn partial_deal(
    acquirer: &mut Firm,
    target: &mut Firm,
    pct: f64,
    price: f64,
    verdict: AntitrustVerdict,
) -> Result<AcquisitionOutcome, AcquisitionError> {
    // The share register is the only step that can still fail.
    target.transfer_shares(&acquirer.name, pct)?;

    let fraction = pct / 100.0;
    let inventory = target.inventory_level.max(0.0) * fraction;
    let capacity = target.production_capacity.max(0.0) * fraction;
    let assets = target.assets.scaled(fraction);
    let personnel = slice_workforce(&target.workforce, fraction);
    let slice_value = assets.total() + inventory * MATERIAL_COST_PER_UNIT;
    let goodwill = price - target.equity * fraction;
    let proceeds = price * PARTIAL_DEAL_TARGET_SHARE;

    acquirer.cash -= price;
    acquirer.equity += slice_value - price;
    add_assets(&mut acquirer.assets, &assets);
    acquirer.inventory_level += inventory;
    add_workforce(&mut acquirer.workforce, &personnel);
    acquirer.production_capacity += capacity;
    acquirer.clamp_capacity_to_ceiling();
    *acquirer.portfolio.entry(target.id).or_insert(0.0) += pct;

    target.cash += proceeds;
    target.equity += proceeds - slice_value;
    target.assets.buildings -= assets.buildings;
    target.assets.machines -= assets.machines;
    target.assets.equipment -= assets.equipment;
    target.inventory_level -= inventory;
    target.production_capacity -= capacity;
    target.workforce.unskilled -= personnel.unskilled;
    target.workforce.semi_skilled -= personnel.semi_skilled;
    target.workforce.skilled -= personnel.skilled;
    target.clamp_capacity_to_ceiling();

    Ok(AcquisitionOutcome {
        kind: DealKind::Partial,
        acquirer_id: acquirer.id,
        target_id: target.id,
        target_name: target.name.clone(),
        percentage: pct,
        price,
        verdict,
        inventory_transferred: inventory,
        capacity_transferred: capacity,
        assets_transferred: assets,
        personnel_transferred: personnel,
        goodwill,
        target_proceeds: proceeds,
    })
}
