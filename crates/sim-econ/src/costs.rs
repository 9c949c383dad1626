//! Cost components of one quarter.

use sim_core::model::FixedAssets;
use sim_core::params::*;
use sim_core::Firm;

/// Materials plus production per unit, after efficiency programmes and
/// machine efficiency.
pub fn unit_variable_cost(firm: &Firm) -> f64 {
    let materials = MATERIAL_COST_PER_UNIT * firm.efficiency.supplier;
    let production = PRODUCTION_COST_PER_UNIT * firm.efficiency.process;
    (materials + production) / firm.machine_class.efficiency_factor()
}

pub fn unit_energy_cost(firm: &Firm) -> f64 {
    ENERGY_COST_PER_UNIT * firm.machine_class.energy_cost_factor()
}

/// Holding cost on the material value of stock.
pub fn inventory_holding_cost(firm: &Firm) -> f64 {
    firm.inventory_value().max(0.0) * INVENTORY_HOLDING_RATE
}

/// Depreciation charge per asset class.
pub fn depreciation_charges(firm: &Firm) -> FixedAssets {
    let a = &firm.assets;
    let r = &firm.depreciation_rates;
    FixedAssets {
        buildings: a.buildings.max(0.0) * r.buildings,
        machines: a.machines.max(0.0) * r.machines,
        equipment: a.equipment.max(0.0) * r.equipment,
    }
}

pub fn overhead_cost(firm: &Firm) -> f64 {
    OVERHEAD_COSTS * firm.efficiency.overhead
}

/// Legacy interest on debt without a loan contract plus every loan's own interest.
pub fn interest_cost(firm: &Firm) -> f64 {
    let legacy = firm.legacy_debt() * LEGACY_QUARTERLY_INTEREST;
    let loans: f64 = firm.loans.iter().map(|l| l.interest_due()).sum();
    legacy + loans
}
