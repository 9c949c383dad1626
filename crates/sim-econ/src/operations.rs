//! Plant, personnel and product development.

use sim_core::model::{LifecycleStage, MachineClass, Qualification};
use sim_core::params::*;
use sim_core::{BusinessError, Firm};
use tracing::debug;

fn ensure_cash(firm: &Firm, needed: f64) -> Result<(), BusinessError> {
    if firm.cash < needed {
        return Err(BusinessError::InsufficientCash {
            needed,
            available: firm.cash,
        });
    }
    Ok(())
}

/// Moves the machine park up exactly one class, capitalising the cost.
pub fn upgrade_machines(firm: &mut Firm, target: MachineClass) -> Result<f64, BusinessError> {
    if firm.is_bankrupt {
        return Err(BusinessError::Bankrupt);
    }
    let next = firm.machine_class.next().ok_or(BusinessError::MachinesAtMaximum)?;
    if target != next {
        return Err(BusinessError::UpgradeNotAllowed {
            from: firm.machine_class,
            to: target,
        });
    }
    let cost = firm
        .machine_class
        .upgrade_cost()
        .ok_or(BusinessError::MachinesAtMaximum)?;
    ensure_cash(firm, cost)?;
    firm.cash -= cost;
    firm.assets.machines += cost;
    firm.machine_class = target;
    debug!(firm = %firm.id, class = %target, cost, "machines upgraded");
    Ok(cost)
}

/// Hires `count` employees, paying the recruiting fee up front.
pub fn hire_personnel(firm: &mut Firm, qualification: Qualification, count: u32) -> Result<f64, BusinessError> {
    if firm.is_bankrupt {
        return Err(BusinessError::Bankrupt);
    }
    if count == 0 {
        return Err(BusinessError::InvalidAmount);
    }
    let cost = qualification.hiring_fee() * count as f64;
    ensure_cash(firm, cost)?;
    firm.cash -= cost;
    let headcount = firm.workforce.count_mut(qualification);
    *headcount = headcount.saturating_add(count);
    Ok(cost)
}

/// Releases `count` employees against severance. Committed capacity is
/// lowered if the smaller workforce can no longer deliver it.
pub fn fire_personnel(firm: &mut Firm, qualification: Qualification, count: u32) -> Result<f64, BusinessError> {
    if firm.is_bankrupt {
        return Err(BusinessError::Bankrupt);
    }
    if count == 0 {
        return Err(BusinessError::InvalidAmount);
    }
    let available = firm.workforce.count(qualification);
    if count > available {
        return Err(BusinessError::InsufficientPersonnel {
            qualification,
            requested: count,
            available,
        });
    }
    let cost = qualification.severance() * count as f64;
    ensure_cash(firm, cost)?;
    firm.cash -= cost;
    *firm.workforce.count_mut(qualification) -= count;
    firm.clamp_capacity_to_ceiling();
    Ok(cost)
}

/// Parses the qualification key and hires. Accepts the German tier names.
pub fn hire_by_key(firm: &mut Firm, key: &str, count: u32) -> Result<f64, BusinessError> {
    hire_personnel(firm, key.parse()?, count)
}

pub fn fire_by_key(firm: &mut Firm, key: &str, count: u32) -> Result<f64, BusinessError> {
    fire_personnel(firm, key.parse()?, count)
}

/// Invests in product innovation. Each full threshold of cumulative spend
/// raises the innovation level and relaunches the product. Returns the
/// number of levels gained.
pub fn invest_in_innovation(firm: &mut Firm, amount: f64) -> Result<u32, BusinessError> {
    if firm.is_bankrupt {
        return Err(BusinessError::Bankrupt);
    }
    if !(amount.is_finite() && amount > 0.0) {
        return Err(BusinessError::InvalidAmount);
    }
    ensure_cash(firm, amount)?;
    firm.cash -= amount;
    firm.innovation_investment += amount;
    let mut levels = 0;
    while firm.innovation_investment >= INNOVATION_THRESHOLD {
        firm.innovation_investment -= INNOVATION_THRESHOLD;
        firm.innovation_level += 1;
        levels += 1;
    }
    if levels > 0 {
        firm.product_age_quarters = 0;
        firm.lifecycle_stage = LifecycleStage::Introduction;
        debug!(firm = %firm.id, level = firm.innovation_level, "product relaunched");
    }
    Ok(levels)
}

fn step_factor(progress: &mut f64, spend: f64, factor: &mut f64, floor: f64) {
    *progress += spend.max(0.0);
    while *progress >= EFFICIENCY_THRESHOLD {
        *progress -= EFFICIENCY_THRESHOLD;
        *factor = (*factor * EFFICIENCY_STEP).max(floor);
    }
}

/// Pays this quarter's efficiency programmes and converts accumulated spend
/// into permanent multipliers. Returns the cash spent.
pub fn apply_efficiency_programmes(firm: &mut Firm) -> f64 {
    let spend = firm.efficiency_investment;
    step_factor(
        &mut firm.efficiency_progress.process_optimization,
        spend.process_optimization,
        &mut firm.efficiency.process,
        MIN_PROCESS_FACTOR,
    );
    step_factor(
        &mut firm.efficiency_progress.supplier_negotiation,
        spend.supplier_negotiation,
        &mut firm.efficiency.supplier,
        MIN_SUPPLIER_FACTOR,
    );
    step_factor(
        &mut firm.efficiency_progress.overhead_reduction,
        spend.overhead_reduction,
        &mut firm.efficiency.overhead,
        MIN_OVERHEAD_FACTOR,
    );
    let total = spend.total().max(0.0);
    firm.cash -= total;
    firm.efficiency_investment = Default::default();
    total
}

/// Adds the quarter's R&D budget to progress and raises quality one level per
/// full step, up to the maximum.
pub fn apply_research(firm: &mut Firm) -> u8 {
    firm.rd_progress += firm.rd_budget.max(0.0);
    let mut gained = 0;
    while firm.rd_progress >= RD_COST_PER_QUALITY_LEVEL && firm.quality_level < MAX_QUALITY {
        firm.rd_progress -= RD_COST_PER_QUALITY_LEVEL;
        firm.quality_level += 1;
        gained += 1;
    }
    if firm.quality_level >= MAX_QUALITY {
        firm.rd_progress = firm.rd_progress.min(RD_COST_PER_QUALITY_LEVEL);
    }
    gained
}

/// Ages the product by one quarter.
pub fn advance_lifecycle(firm: &mut Firm) {
    firm.product_age_quarters = firm.product_age_quarters.saturating_add(1);
    firm.lifecycle_stage = LifecycleStage::from_age(firm.product_age_quarters);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::model::{EfficiencyInvestments, FirmId};

    fn firm() -> Firm {
        Firm::new(FirmId(1), "Acme", "alice")
    }

    #[test]
    fn upgrades_go_one_class_at_a_time() {
        let mut f = firm();
        assert_eq!(
            upgrade_machines(&mut f, MachineClass::Premium),
            Err(BusinessError::UpgradeNotAllowed {
                from: MachineClass::Basic,
                to: MachineClass::Premium
            })
        );
        let ceiling = f.max_capacity();
        assert_eq!(upgrade_machines(&mut f, MachineClass::Professional), Ok(3_000_000.0));
        assert_eq!(f.machine_class, MachineClass::Professional);
        assert_eq!(f.assets.machines, START_MACHINES + 3_000_000.0);
        assert!(f.max_capacity() > ceiling);
        assert!(matches!(
            upgrade_machines(&mut f, MachineClass::Premium),
            Err(BusinessError::InsufficientCash { .. })
        ));
        f.cash = 10_000_000.0;
        upgrade_machines(&mut f, MachineClass::Premium).unwrap();
        assert_eq!(
            upgrade_machines(&mut f, MachineClass::Premium),
            Err(BusinessError::MachinesAtMaximum)
        );
    }

    #[test]
    fn firing_reclamps_capacity() {
        let mut f = firm();
        f.production_capacity = f.max_capacity();
        fire_by_key(&mut f, "facharbeiter", 30).unwrap();
        assert_eq!(f.workforce.skilled, 0);
        assert!(f.production_capacity <= f.max_capacity() + 1e-9);
        assert!(matches!(
            fire_personnel(&mut f, Qualification::Skilled, 1),
            Err(BusinessError::InsufficientPersonnel { .. })
        ));
        assert!(matches!(
            hire_by_key(&mut f, "wizard", 1),
            Err(BusinessError::InvalidQualification(_))
        ));
    }

    #[test]
    fn hiring_costs_fees() {
        let mut f = firm();
        let cost = hire_personnel(&mut f, Qualification::Skilled, 10).unwrap();
        assert_eq!(cost, 40_000.0);
        assert_eq!(f.workforce.skilled, 40);
        assert_eq!(f.cash, START_CASH - 40_000.0);
    }

    #[test]
    fn innovation_resets_product_age() {
        let mut f = firm();
        f.cash = 20_000_000.0;
        f.product_age_quarters = 30;
        f.lifecycle_stage = LifecycleStage::Decline;
        assert_eq!(invest_in_innovation(&mut f, 3_000_000.0), Ok(0));
        assert_eq!(f.product_age_quarters, 30);
        assert_eq!(invest_in_innovation(&mut f, 3_000_000.0), Ok(1));
        assert_eq!(f.innovation_level, 1);
        assert_eq!(f.product_age_quarters, 0);
        assert_eq!(f.lifecycle_stage, LifecycleStage::Introduction);
        assert!((f.innovation_investment - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn efficiency_steps_respect_floors() {
        let mut f = firm();
        f.efficiency_investment = EfficiencyInvestments {
            process_optimization: 2_500_000.0,
            supplier_negotiation: 0.0,
            overhead_reduction: 50_000_000.0,
        };
        let spent = apply_efficiency_programmes(&mut f);
        assert_eq!(spent, 52_500_000.0);
        assert!((f.efficiency.process - 0.95 * 0.95).abs() < 1e-12);
        assert!((f.efficiency_progress.process_optimization - 500_000.0).abs() < 1e-6);
        assert_eq!(f.efficiency.supplier, 1.0);
        assert_eq!(f.efficiency.overhead, MIN_OVERHEAD_FACTOR);
        assert_eq!(f.efficiency_investment, EfficiencyInvestments::default());
    }

    #[test]
    fn research_raises_quality_stepwise() {
        let mut f = firm();
        f.rd_budget = RD_COST_PER_QUALITY_LEVEL * 0.4;
        assert_eq!(apply_research(&mut f), 0);
        assert_eq!(apply_research(&mut f), 0);
        assert_eq!(apply_research(&mut f), 1);
        assert_eq!(f.quality_level, START_QUALITY + 1);
        assert!((f.rd_progress - RD_COST_PER_QUALITY_LEVEL * 0.2).abs() < 1e-6);
        f.quality_level = MAX_QUALITY;
        f.rd_budget = RD_COST_PER_QUALITY_LEVEL * 3.0;
        assert_eq!(apply_research(&mut f), 0);
        assert_eq!(f.quality_level, MAX_QUALITY);
    }
}
