//! Decision validator.
//!
//! Proposed decisions are clamped field by field, never rejected. The only
//! coupling between fields is through the shared cash and capacity ceilings.

use serde::{Deserialize, Serialize};
use sim_core::model::{DepreciationRates, EfficiencyInvestments};
use sim_core::params::*;
use sim_core::Firm;

/// Optional depreciation overrides; `None` keeps the current rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationOverrides {
    pub buildings: Option<f64>,
    pub machines: Option<f64>,
    pub equipment: Option<f64>,
}

/// A firm's decisions for the coming quarter, as submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionBundle {
    pub price: f64,
    pub capacity: f64,
    pub marketing: f64,
    pub rd: f64,
    pub quality: i32,
    /// Percent, `0..=100`.
    pub safety_stock_pct: f64,
    #[serde(default)]
    pub efficiency: Option<EfficiencyInvestments>,
    #[serde(default)]
    pub depreciation: Option<DepreciationOverrides>,
}

impl DecisionBundle {
    /// The firm's standing decisions, expressed as a bundle.
    pub fn current(firm: &Firm) -> Self {
        Self {
            price: firm.product_price,
            capacity: firm.production_capacity,
            marketing: firm.marketing_budget,
            rd: firm.rd_budget,
            quality: firm.quality_level as i32,
            safety_stock_pct: firm.safety_stock * 100.0,
            efficiency: None,
            depreciation: None,
        }
    }
}

/// Clamp into `[lo, hi]`; non-finite input falls to `lo`.
fn bounded(value: f64, lo: f64, hi: f64) -> f64 {
    if !value.is_finite() {
        return lo;
    }
    value.clamp(lo, hi.max(lo))
}

fn rate(value: Option<f64>, current: f64) -> f64 {
    match value {
        Some(v) => bounded(v, MIN_DEPRECIATION_RATE, MAX_DEPRECIATION_RATE),
        None => current,
    }
}

/// Sanitises `bundle` against the firm's limits and stores it as the firm's
/// decisions for the next quarter. Financial results are untouched.
pub fn apply_decisions(firm: &mut Firm, bundle: &DecisionBundle) {
    let cash = firm.cash.max(0.0);

    firm.product_price = bounded(bundle.price, MIN_PRICE, MAX_PRICE);
    firm.production_capacity = bounded(bundle.capacity, 0.0, firm.max_capacity());
    firm.marketing_budget = bounded(bundle.marketing, 0.0, cash * MAX_MARKETING_CASH_SHARE);
    firm.rd_budget = bounded(bundle.rd, 0.0, cash * MAX_RD_CASH_SHARE);
    firm.quality_level = bundle.quality.clamp(MIN_QUALITY as i32, MAX_QUALITY as i32) as u8;
    firm.safety_stock = bounded(bundle.safety_stock_pct / 100.0, 0.0, 1.0);

    if let Some(inv) = bundle.efficiency {
        let cap = cash * MAX_EFFICIENCY_CASH_SHARE;
        firm.efficiency_investment = EfficiencyInvestments {
            process_optimization: bounded(inv.process_optimization, 0.0, cap),
            supplier_negotiation: bounded(inv.supplier_negotiation, 0.0, cap),
            overhead_reduction: bounded(inv.overhead_reduction, 0.0, cap),
        };
    }

    if let Some(overrides) = bundle.depreciation {
        let current = firm.depreciation_rates;
        firm.depreciation_rates = DepreciationRates {
            buildings: rate(overrides.buildings, current.buildings),
            machines: rate(overrides.machines, current.machines),
            equipment: rate(overrides.equipment, current.equipment),
        };
    }
}
