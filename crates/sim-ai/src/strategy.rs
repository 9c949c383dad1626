//! Rule-based bot strategies.
//!
//! A bot first classifies itself by a fixed priority cascade, then samples
//! its decisions uniformly inside the ranges of the chosen strategy. Only the
//! sampling is random; the cascade is deterministic.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_core::model::{LifecycleStage, MachineClass};
use sim_core::params::{
    MAX_MARKETING_CASH_SHARE, MAX_QUALITY, MIN_QUALITY, START_CAPACITY, START_MARKETING, START_PRICE, START_QUALITY,
};
use sim_core::{BusinessError, Firm, ValidationError};
use sim_econ::{financing, operations, AntitrustTier, DecisionBundle};
use tracing::debug;

/// Aggregates over the live firms of a market.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub firm_count: usize,
    pub avg_price: f64,
    pub avg_capacity: f64,
    pub avg_marketing: f64,
    pub avg_quality: f64,
    pub total_revenue: f64,
}

impl MarketStats {
    /// Averages over non-bankrupt firms.
    pub fn from_firms<'a>(firms: impl IntoIterator<Item = &'a Firm>) -> Self {
        let mut stats = MarketStats::default();
        for f in firms.into_iter().filter(|f| !f.is_bankrupt) {
            stats.firm_count += 1;
            stats.avg_price += f.product_price;
            stats.avg_capacity += f.production_capacity;
            stats.avg_marketing += f.marketing_budget;
            stats.avg_quality += f.quality_level as f64;
            stats.total_revenue += f.revenue;
        }
        if stats.firm_count > 0 {
            let n = stats.firm_count as f64;
            stats.avg_price /= n;
            stats.avg_capacity /= n;
            stats.avg_marketing /= n;
            stats.avg_quality /= n;
        }
        stats
    }

    /// Average price, or the opening price in an empty market.
    pub fn reference_price(&self) -> f64 {
        if self.firm_count > 0 && self.avg_price > 0.0 {
            self.avg_price
        } else {
            START_PRICE
        }
    }

    /// Average committed capacity, or the opening capacity in an empty market.
    pub fn reference_capacity(&self) -> f64 {
        if self.firm_count > 0 && self.avg_capacity > 0.0 {
            self.avg_capacity
        } else {
            START_CAPACITY
        }
    }

    pub fn reference_marketing(&self) -> f64 {
        if self.firm_count > 0 && self.avg_marketing > 0.0 {
            self.avg_marketing
        } else {
            START_MARKETING
        }
    }

    /// Average quality rounded to a whole level.
    pub fn reference_quality(&self) -> i32 {
        if self.firm_count > 0 && self.avg_quality > 0.0 {
            self.avg_quality.round() as i32
        } else {
            START_QUALITY as i32
        }
    }
}

/// Ordered by cascade priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    AntitrustCritical,
    AntitrustPenalty,
    AntitrustWarning,
    AntitrustApproaching,
    MarketLeader,
    AggressiveGrowth,
    Survival,
    InnovationFocus,
    Balanced,
}

/// Sampling ranges for one strategy.
///
/// Price, capacity and marketing are multiples of the market average, quality
/// is an offset from the average level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrategyRanges {
    pub price: (f64, f64),
    /// Capped at the firm's own capacity ceiling.
    pub capacity: (f64, f64),
    /// Capped at the share of cash a decision may commit.
    pub marketing: (f64, f64),
    /// Fraction of the firm's cash.
    pub rd: (f64, f64),
    pub quality: (i32, i32),
    /// Percent.
    pub safety_stock: (f64, f64),
}

impl Strategy {
    pub fn ranges(self) -> StrategyRanges {
        let r = |price, capacity, marketing, rd, quality, safety_stock| StrategyRanges {
            price,
            capacity,
            marketing,
            rd,
            quality,
            safety_stock,
        };
        match self {
            Strategy::AntitrustCritical => r((1.05, 1.15), (0.60, 0.75), (0.0, 0.3), (0.01, 0.03), (-1, 0), (15.0, 25.0)),
            Strategy::AntitrustPenalty => r((1.00, 1.10), (0.70, 0.85), (0.2, 0.5), (0.01, 0.04), (-1, 1), (15.0, 25.0)),
            Strategy::AntitrustWarning => r((0.98, 1.05), (0.80, 0.95), (0.4, 0.8), (0.02, 0.04), (0, 1), (15.0, 25.0)),
            Strategy::AntitrustApproaching => r((0.95, 1.05), (0.85, 1.00), (0.6, 1.0), (0.02, 0.05), (0, 1), (12.0, 22.0)),
            Strategy::MarketLeader => r((1.00, 1.10), (0.95, 1.15), (0.9, 1.3), (0.03, 0.06), (0, 2), (10.0, 20.0)),
            Strategy::AggressiveGrowth => r((0.85, 0.98), (1.05, 1.30), (1.2, 1.8), (0.03, 0.06), (0, 2), (10.0, 20.0)),
            Strategy::Survival => r((1.00, 1.10), (0.50, 0.75), (0.0, 0.3), (0.0, 0.0), (-2, 0), (15.0, 30.0)),
            Strategy::InnovationFocus => r((0.95, 1.05), (0.75, 0.95), (0.8, 1.2), (0.10, 0.18), (1, 3), (10.0, 20.0)),
            Strategy::Balanced => r((0.95, 1.08), (0.85, 1.05), (0.8, 1.2), (0.01, 0.04), (-1, 1), (15.0, 25.0)),
        }
    }
}

/// Thresholds and odds of the bot heuristics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub market_leader_share: f64,
    pub aggressive_cash: f64,
    pub survival_cash: f64,
    pub innovation_cash: f64,
    /// Cash that must remain after paying for a machine upgrade.
    pub upgrade_reserve: f64,
    pub upgrade_min_quarter: u32,
    pub upgrade_probability: f64,
    pub loan_cash_trigger: f64,
    pub max_loans: usize,
    pub loan_probability: f64,
    pub issue_min_quarter: u32,
    pub issue_cash_trigger: f64,
    pub issue_probability: f64,
    pub innovation_probability: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            market_leader_share: 0.15,
            aggressive_cash: 8_000_000.0,
            survival_cash: 2_000_000.0,
            innovation_cash: 5_000_000.0,
            upgrade_reserve: 3_000_000.0,
            upgrade_min_quarter: 4,
            upgrade_probability: 0.15,
            loan_cash_trigger: 1_500_000.0,
            max_loans: 2,
            loan_probability: 0.5,
            issue_min_quarter: 8,
            issue_cash_trigger: 2_000_000.0,
            issue_probability: 0.05,
            innovation_probability: 0.3,
        }
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, p) in [
            ("upgrade_probability", self.upgrade_probability),
            ("loan_probability", self.loan_probability),
            ("issue_probability", self.issue_probability),
            ("innovation_probability", self.innovation_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ValidationError::OutOfRange { field, min: 0.0, max: 1.0 });
            }
        }
        for (field, v) in [
            ("market_leader_share", self.market_leader_share),
            ("aggressive_cash", self.aggressive_cash),
            ("survival_cash", self.survival_cash),
            ("innovation_cash", self.innovation_cash),
            ("upgrade_reserve", self.upgrade_reserve),
            ("loan_cash_trigger", self.loan_cash_trigger),
            ("issue_cash_trigger", self.issue_cash_trigger),
        ] {
            if v.is_nan() {
                return Err(ValidationError::NonFinite(field));
            }
        }
        Ok(())
    }
}

/// Infrequent moves beyond the regular decisions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SecondaryAction {
    UpgradeMachines(MachineClass),
    EmergencyLoan(f64),
    IssueShares(f64),
    Innovate(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BotDecision {
    pub strategy: Strategy,
    pub bundle: DecisionBundle,
    pub secondary: Vec<SecondaryAction>,
}

/// Priority cascade: antitrust tiers first, then leadership, growth, survival,
/// innovation and the balanced default.
pub fn select_strategy(firm: &Firm, config: &BotConfig) -> Strategy {
    match AntitrustTier::from_share(firm.market_share) {
        AntitrustTier::Critical => return Strategy::AntitrustCritical,
        AntitrustTier::Penalty => return Strategy::AntitrustPenalty,
        AntitrustTier::Warning => return Strategy::AntitrustWarning,
        AntitrustTier::Approaching => return Strategy::AntitrustApproaching,
        AntitrustTier::Clear => {}
    }
    if firm.market_share >= config.market_leader_share {
        Strategy::MarketLeader
    } else if firm.cash > config.aggressive_cash && firm.profit > 0.0 {
        Strategy::AggressiveGrowth
    } else if firm.cash < config.survival_cash {
        Strategy::Survival
    } else if firm.lifecycle_stage == LifecycleStage::Decline && firm.cash > config.innovation_cash {
        Strategy::InnovationFocus
    } else {
        Strategy::Balanced
    }
}

fn sample<R: Rng>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

/// Decisions for one bot firm this quarter.
pub fn decide<R: Rng>(
    firm: &Firm,
    market: &MarketStats,
    quarter: u32,
    config: &BotConfig,
    rng: &mut R,
) -> BotDecision {
    let strategy = select_strategy(firm, config);
    let ranges = strategy.ranges();
    let cash = firm.cash.max(0.0);

    let bundle = DecisionBundle {
        price: market.reference_price() * sample(rng, ranges.price),
        capacity: (market.reference_capacity() * sample(rng, ranges.capacity)).min(firm.max_capacity()),
        marketing: (market.reference_marketing() * sample(rng, ranges.marketing)).min(cash * MAX_MARKETING_CASH_SHARE),
        rd: cash * sample(rng, ranges.rd),
        quality: (market.reference_quality() + rng.gen_range(ranges.quality.0..=ranges.quality.1))
            .clamp(MIN_QUALITY as i32, MAX_QUALITY as i32),
        safety_stock_pct: sample(rng, ranges.safety_stock),
        efficiency: None,
        depreciation: None,
    };

    let mut secondary = Vec::new();
    if let (Some(next), Some(cost)) = (firm.machine_class.next(), firm.machine_class.upgrade_cost()) {
        if quarter >= config.upgrade_min_quarter
            && firm.profit > 0.0
            && firm.cash > cost + config.upgrade_reserve
            && rng.gen_bool(config.upgrade_probability)
        {
            secondary.push(SecondaryAction::UpgradeMachines(next));
        }
    }
    let credit = firm.available_credit();
    if firm.cash < config.loan_cash_trigger
        && credit > 0.0
        && firm.loans.len() < config.max_loans
        && rng.gen_bool(config.loan_probability)
    {
        secondary.push(SecondaryAction::EmergencyLoan((credit * 0.5).min(2_000_000.0)));
    }
    if quarter >= config.issue_min_quarter
        && firm.cash < config.issue_cash_trigger
        && rng.gen_bool(config.issue_probability)
    {
        secondary.push(SecondaryAction::IssueShares(rng.gen_range(1_000_000.0..=2_000_000.0)));
    }
    if strategy == Strategy::InnovationFocus && rng.gen_bool(config.innovation_probability) {
        secondary.push(SecondaryAction::Innovate((cash * 0.2).min(2_500_000.0)));
    }

    debug!(firm = %firm.id, ?strategy, actions = secondary.len(), "bot decided");
    BotDecision {
        strategy,
        bundle,
        secondary,
    }
}

/// Carries out one secondary action on the firm.
pub fn execute(firm: &mut Firm, action: &SecondaryAction) -> Result<(), BusinessError> {
    match *action {
        SecondaryAction::UpgradeMachines(target) => operations::upgrade_machines(firm, target).map(drop),
        SecondaryAction::EmergencyLoan(amount) => financing::take_loan(firm, amount, None).map(drop),
        SecondaryAction::IssueShares(amount) => financing::issue_shares(firm, amount).map(drop),
        SecondaryAction::Innovate(amount) => operations::invest_in_innovation(firm, amount).map(drop),
    }
}
