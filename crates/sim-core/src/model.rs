//! Value types shared by the firm record, the ledger and the wire snapshot.

use crate::error::BusinessError;
use crate::params::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique, sequentially assigned firm identifier.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FirmId(pub u32);

impl fmt::Display for FirmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Machine generation. Ordered: basic < professional < premium.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineClass {
    Basic,
    Professional,
    Premium,
}

impl MachineClass {
    /// Output multiplier of the machine park.
    pub fn efficiency_factor(self) -> f64 {
        match self {
            MachineClass::Basic => 0.8,
            MachineClass::Professional => 1.0,
            MachineClass::Premium => 1.3,
        }
    }

    /// Energy cost multiplier; newer machines draw less power.
    pub fn energy_cost_factor(self) -> f64 {
        match self {
            MachineClass::Basic => 1.0,
            MachineClass::Professional => 0.8,
            MachineClass::Premium => 0.7,
        }
    }

    /// Lots the machine park can run per quarter at nominal productivity.
    pub fn lot_capacity(self) -> f64 {
        match self {
            MachineClass::Basic => 500.0,
            MachineClass::Professional => 600.0,
            MachineClass::Premium => 750.0,
        }
    }

    pub fn next(self) -> Option<MachineClass> {
        match self {
            MachineClass::Basic => Some(MachineClass::Professional),
            MachineClass::Professional => Some(MachineClass::Premium),
            MachineClass::Premium => None,
        }
    }

    /// Price of moving to the next class, `None` at the top.
    pub fn upgrade_cost(self) -> Option<f64> {
        match self {
            MachineClass::Basic => Some(3_000_000.0),
            MachineClass::Professional => Some(6_000_000.0),
            MachineClass::Premium => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MachineClass::Basic => "basic",
            MachineClass::Professional => "professional",
            MachineClass::Premium => "premium",
        }
    }
}

impl fmt::Display for MachineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineClass {
    type Err = BusinessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(MachineClass::Basic),
            "professional" => Ok(MachineClass::Professional),
            "premium" => Ok(MachineClass::Premium),
            other => Err(BusinessError::InvalidMachineClass(other.to_string())),
        }
    }
}

/// Workforce skill tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualification {
    Unskilled,
    SemiSkilled,
    Skilled,
}

impl Qualification {
    pub const ALL: [Qualification; 3] = [
        Qualification::Unskilled,
        Qualification::SemiSkilled,
        Qualification::Skilled,
    ];

    pub fn cost_per_quarter(self) -> f64 {
        match self {
            Qualification::Unskilled => 4_500.0,
            Qualification::SemiSkilled => 6_000.0,
            Qualification::Skilled => 9_000.0,
        }
    }

    pub fn productivity(self) -> f64 {
        match self {
            Qualification::Unskilled => 0.7,
            Qualification::SemiSkilled => 1.0,
            Qualification::Skilled => 1.3,
        }
    }

    /// One-off recruiting fee per hire.
    pub fn hiring_fee(self) -> f64 {
        match self {
            Qualification::Unskilled => 1_000.0,
            Qualification::SemiSkilled => 2_000.0,
            Qualification::Skilled => 4_000.0,
        }
    }

    /// Severance per dismissal: half a quarter's cost.
    pub fn severance(self) -> f64 {
        self.cost_per_quarter() * 0.5
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Qualification::Unskilled => "unskilled",
            Qualification::SemiSkilled => "semi_skilled",
            Qualification::Skilled => "skilled",
        }
    }
}

impl fmt::Display for Qualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Qualification {
    type Err = BusinessError;

    /// Accepts the English keys and the German tier names used by older clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unskilled" | "ungelernt" => Ok(Qualification::Unskilled),
            "semi_skilled" | "semi-skilled" | "angelernt" => Ok(Qualification::SemiSkilled),
            "skilled" | "facharbeiter" => Ok(Qualification::Skilled),
            other => Err(BusinessError::InvalidQualification(other.to_string())),
        }
    }
}

/// Headcount per skill tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workforce {
    pub unskilled: u32,
    pub semi_skilled: u32,
    pub skilled: u32,
}

impl Workforce {
    pub fn new(unskilled: u32, semi_skilled: u32, skilled: u32) -> Self {
        Self {
            unskilled,
            semi_skilled,
            skilled,
        }
    }

    pub fn count(&self, q: Qualification) -> u32 {
        match q {
            Qualification::Unskilled => self.unskilled,
            Qualification::SemiSkilled => self.semi_skilled,
            Qualification::Skilled => self.skilled,
        }
    }

    pub fn count_mut(&mut self, q: Qualification) -> &mut u32 {
        match q {
            Qualification::Unskilled => &mut self.unskilled,
            Qualification::SemiSkilled => &mut self.semi_skilled,
            Qualification::Skilled => &mut self.skilled,
        }
    }

    pub fn total(&self) -> u32 {
        self.unskilled
            .saturating_add(self.semi_skilled)
            .saturating_add(self.skilled)
    }

    /// Personnel cost for one quarter.
    pub fn quarterly_cost(&self) -> f64 {
        Qualification::ALL
            .iter()
            .map(|&q| self.count(q) as f64 * q.cost_per_quarter())
            .sum()
    }
}

/// Product lifecycle stage, derived from product age alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Introduction,
    Growth,
    Maturity,
    Decline,
}

impl LifecycleStage {
    pub fn from_age(age_quarters: u32) -> Self {
        if age_quarters >= DECLINE_STAGE_FROM {
            LifecycleStage::Decline
        } else if age_quarters >= MATURITY_STAGE_FROM {
            LifecycleStage::Maturity
        } else if age_quarters >= GROWTH_STAGE_FROM {
            LifecycleStage::Growth
        } else {
            LifecycleStage::Introduction
        }
    }

    /// Relative demand typical for the stage.
    pub fn demand_factor(self) -> f64 {
        match self {
            LifecycleStage::Introduction => 0.7,
            LifecycleStage::Growth => 1.3,
            LifecycleStage::Maturity => 1.0,
            LifecycleStage::Decline => 0.6,
        }
    }
}

/// Book values of the three fixed-asset classes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedAssets {
    pub buildings: f64,
    pub machines: f64,
    pub equipment: f64,
}

impl FixedAssets {
    pub fn total(&self) -> f64 {
        self.buildings + self.machines + self.equipment
    }

    /// Slice of every class by `fraction` in `[0, 1]`.
    pub fn scaled(&self, fraction: f64) -> FixedAssets {
        FixedAssets {
            buildings: self.buildings * fraction,
            machines: self.machines * fraction,
            equipment: self.equipment * fraction,
        }
    }
}

/// Quarterly depreciation rates per asset class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepreciationRates {
    pub buildings: f64,
    pub machines: f64,
    pub equipment: f64,
}

impl Default for DepreciationRates {
    fn default() -> Self {
        Self {
            buildings: DEFAULT_BUILDINGS_DEPRECIATION,
            machines: DEFAULT_MACHINES_DEPRECIATION,
            equipment: DEFAULT_EQUIPMENT_DEPRECIATION,
        }
    }
}

/// Amounts for the three efficiency programmes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyInvestments {
    pub process_optimization: f64,
    pub supplier_negotiation: f64,
    pub overhead_reduction: f64,
}

impl EfficiencyInvestments {
    pub fn total(&self) -> f64 {
        self.process_optimization + self.supplier_negotiation + self.overhead_reduction
    }
}

/// Permanent cost multipliers earned through efficiency programmes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyFactors {
    /// Scales the production cost per unit.
    pub process: f64,
    /// Scales the material cost per unit.
    pub supplier: f64,
    /// Scales fixed overhead.
    pub overhead: f64,
}

impl Default for EfficiencyFactors {
    fn default() -> Self {
        Self {
            process: 1.0,
            supplier: 1.0,
            overhead: 1.0,
        }
    }
}

/// An amortizing loan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub principal: f64,
    pub annual_rate: f64,
    pub quarters_remaining: u32,
    pub quarterly_payment: f64,
}

impl Loan {
    /// Builds an annuity loan. `quarters` must be at least one.
    pub fn annuity(principal: f64, annual_rate: f64, quarters: u32) -> Self {
        let n = quarters.max(1);
        let r = annual_rate / 4.0;
        let payment = if r > 0.0 {
            principal * r / (1.0 - (1.0 + r).powi(-(n as i32)))
        } else {
            principal / n as f64
        };
        Self {
            principal,
            annual_rate,
            quarters_remaining: n,
            quarterly_payment: payment,
        }
    }

    pub fn quarterly_rate(&self) -> f64 {
        self.annual_rate / 4.0
    }

    pub fn interest_due(&self) -> f64 {
        self.principal * self.quarterly_rate()
    }
}

/// One past quarter, kept for charts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub quarter: u32,
    pub revenue: f64,
    pub profit: f64,
    pub cash: f64,
    pub roi: f64,
    pub market_share: f64,
    pub units_sold: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Materials and production for the committed output.
    pub variable: f64,
    pub energy: f64,
    pub inventory: f64,
    pub personnel: f64,
    pub depreciation: f64,
    pub overhead: f64,
    pub marketing: f64,
    pub rd: f64,
    pub interest: f64,
    pub total: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesDetail {
    pub units_sold: f64,
    pub effective_demand: f64,
    pub effective_price: f64,
    pub quality_premium: f64,
    pub price_factor: f64,
    pub marketing_factor: f64,
    pub stockout_penalty: f64,
}

/// Margins in percent, EBITDA in euros.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    pub ebitda: f64,
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub net_margin: f64,
    pub contribution_margin: f64,
    pub roe: f64,
    pub roa: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRatios {
    pub asset_turnover: f64,
    pub inventory_turnover: f64,
    pub capacity_utilization: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeverageRatios {
    pub debt_to_equity: f64,
    pub equity_ratio: f64,
    pub debt_ratio: f64,
    /// `None` when there is no interest to cover and EBIT is positive.
    pub interest_coverage: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub revenue_growth: f64,
    pub profit_growth: f64,
    pub market_share_growth: f64,
}

/// Liquidity ratios; `None` means no current liabilities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Liquidity {
    pub liquidity_1: Option<f64>,
    pub liquidity_2: Option<f64>,
    pub liquidity_3: Option<f64>,
    pub current_liabilities: f64,
    pub receivables: f64,
}

impl Liquidity {
    pub fn status(&self) -> LiquidityStatus {
        LiquidityStatus::from_ratio(self.liquidity_1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquidityStatus {
    Healthy,
    Good,
    Warning,
    Critical,
}

impl LiquidityStatus {
    pub fn from_ratio(cash_ratio: Option<f64>) -> Self {
        match cash_ratio {
            None => LiquidityStatus::Healthy,
            Some(r) if r >= 1.5 => LiquidityStatus::Healthy,
            Some(r) if r >= 1.0 => LiquidityStatus::Good,
            Some(r) if r >= 0.5 => LiquidityStatus::Warning,
            Some(_) => LiquidityStatus::Critical,
        }
    }

    pub fn recommendation(self, unlimited: bool) -> &'static str {
        match self {
            LiquidityStatus::Healthy if unlimited => {
                "No current liabilities. Ready for investments."
            }
            LiquidityStatus::Healthy => "Liquidity is healthy.",
            LiquidityStatus::Good => "Liquidity is good. Keep monitoring.",
            LiquidityStatus::Warning => "Liquidity is low. Watch cash flow and cut costs.",
            LiquidityStatus::Critical => "Critical: take a loan or cut costs immediately.",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: f64,
    /// Materials, production, energy and inventory holding.
    pub variable_costs: f64,
    pub gross_profit: f64,
    pub personnel: f64,
    pub overhead: f64,
    pub depreciation: f64,
    pub marketing: f64,
    pub rd: f64,
    pub ebit: f64,
    pub interest: f64,
    pub ebt: f64,
    pub taxes: f64,
    pub net_profit: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionMargin {
    pub unit_price: f64,
    pub unit_variable_cost: f64,
    pub unit_contribution: f64,
    pub total_contribution: f64,
    /// Percent of the unit price.
    pub contribution_ratio: f64,
    /// `None` when each unit loses money.
    pub break_even_units: Option<f64>,
}

/// What one quarter produced for one firm.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterResults {
    pub quarter: u32,
    pub revenue: f64,
    pub profit: f64,
    pub ebit: f64,
    pub cash: f64,
    pub inventory: f64,
    pub roi: f64,
    pub market_share: f64,
    pub costs: CostBreakdown,
    pub sales: SalesDetail,
}

/// One creditor's share of a liquidation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditorClaim {
    /// `loan 1`, `loan 2`, ... in borrowing order, or `legacy debt`.
    pub creditor: String,
    pub claim: f64,
    /// Claim times the recovery rate.
    pub payout: f64,
}

/// Outcome of liquidating a bankrupt firm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BankruptcyReport {
    pub firm_id: FirmId,
    pub firm_name: String,
    /// Quarter in which the firm failed.
    pub quarter: u32,
    /// Cash balance that triggered the insolvency, usually negative.
    pub cash_at_failure: f64,
    /// Discounted asset and inventory value plus any remaining cash.
    pub liquidation_value: f64,
    /// Administrator's fee, paid first.
    pub administrative_costs: f64,
    /// Outstanding wages, paid ahead of creditors.
    pub priority_claims_paid: f64,
    /// Sum of every creditor's claim.
    pub creditor_claims: f64,
    /// Sum of every creditor's payout.
    pub creditor_payout: f64,
    /// Fraction of creditor claims recovered, 1.0 when there were none.
    pub recovery_rate: f64,
    /// Per-creditor split of the payout.
    #[serde(default)]
    pub creditors: Vec<CreditorClaim>,
    /// What is left for the owners once every claim is met.
    pub shareholder_residual: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_classes_are_ordered() {
        assert!(MachineClass::Basic < MachineClass::Professional);
        assert!(MachineClass::Professional < MachineClass::Premium);
        assert_eq!(MachineClass::Basic.next(), Some(MachineClass::Professional));
        assert_eq!(MachineClass::Premium.next(), None);
        assert!(MachineClass::Premium.upgrade_cost().is_none());
    }

    #[test]
    fn qualification_accepts_aliases() {
        assert_eq!("ungelernt".parse::<Qualification>(), Ok(Qualification::Unskilled));
        assert_eq!("Angelernt".parse::<Qualification>(), Ok(Qualification::SemiSkilled));
        assert_eq!("skilled".parse::<Qualification>(), Ok(Qualification::Skilled));
        assert_eq!(
            "manager".parse::<Qualification>(),
            Err(BusinessError::InvalidQualification("manager".into()))
        );
    }

    #[test]
    fn lifecycle_bands() {
        assert_eq!(LifecycleStage::from_age(0), LifecycleStage::Introduction);
        assert_eq!(LifecycleStage::from_age(4), LifecycleStage::Introduction);
        assert_eq!(LifecycleStage::from_age(5), LifecycleStage::Growth);
        assert_eq!(LifecycleStage::from_age(12), LifecycleStage::Growth);
        assert_eq!(LifecycleStage::from_age(13), LifecycleStage::Maturity);
        assert_eq!(LifecycleStage::from_age(25), LifecycleStage::Decline);
    }

    #[test]
    fn annuity_repays_principal() {
        let loan = Loan::annuity(1_000_000.0, 0.10, 12);
        let total = loan.quarterly_payment * 12.0;
        assert!(total > 1_000_000.0);
        assert!(total < 1_200_000.0);
        let zero_rate = Loan::annuity(1_200.0, 0.0, 12);
        assert!((zero_rate.quarterly_payment - 100.0).abs() < 1e-9);
    }

    #[test]
    fn liquidity_status_tiers() {
        assert_eq!(LiquidityStatus::from_ratio(None), LiquidityStatus::Healthy);
        assert_eq!(LiquidityStatus::from_ratio(Some(1.2)), LiquidityStatus::Good);
        assert_eq!(LiquidityStatus::from_ratio(Some(0.7)), LiquidityStatus::Warning);
        assert_eq!(LiquidityStatus::from_ratio(Some(0.1)), LiquidityStatus::Critical);
    }

    #[test]
    fn workforce_cost() {
        let w = Workforce::new(2, 1, 1);
        assert_eq!(w.total(), 4);
        assert!((w.quarterly_cost() - (9_000.0 + 6_000.0 + 9_000.0)).abs() < 1e-9);
    }
}
