//! The firm record: identity, decisions, assets, derived metrics and history.

use crate::capacity;
use crate::error::{BusinessError, ValidationError};
use crate::model::*;
use crate::params::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SHARE_EPSILON: f64 = 1e-6;

/// A firm competing in the market.
///
/// Decision fields (`product_price` through `depreciation_rates`) take effect at
/// the next quarter close. Result fields are overwritten by the ledger every
/// quarter and are never read back as inputs, except the `prev_*` values used
/// for growth rates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Firm {
    /// Session-unique identifier, never reused.
    pub id: FirmId,
    /// Display name, unique within a session.
    pub name: String,
    /// Players steering this firm; the first one founded it.
    pub user_names: Vec<String>,

    /// Cash on hand; insolvency once this reaches zero.
    pub cash: f64,
    /// Loan principal plus legacy debt.
    pub debt: f64,
    /// Book equity.
    pub equity: f64,
    /// Cumulative net profit kept in the firm.
    pub retained_earnings: f64,

    /// Unit price in euros.
    pub product_price: f64,
    /// Units committed to production, at most the ceiling.
    pub production_capacity: f64,
    /// Quarterly marketing spend.
    pub marketing_budget: f64,
    /// Quarterly R&D spend, added to `rd_progress` at close.
    pub rd_budget: f64,
    /// Product quality, 1 to 10.
    pub quality_level: u8,
    /// Fraction in `[0, 1]`.
    pub safety_stock: f64,
    /// One-time programme spend for the coming quarter.
    pub efficiency_investment: EfficiencyInvestments,
    /// Quarterly rates per asset class.
    pub depreciation_rates: DepreciationRates,

    /// Book values of buildings, machines and equipment.
    pub assets: FixedAssets,
    /// Sets lot capacity, efficiency and energy cost.
    pub machine_class: MachineClass,
    /// Headcount per qualification.
    pub workforce: Workforce,
    /// Finished units in stock.
    pub inventory_level: f64,
    /// Permanent cost multipliers earned by programme spend.
    pub efficiency: EfficiencyFactors,
    /// Programme spend accumulated towards the next multiplier step.
    pub efficiency_progress: EfficiencyInvestments,

    /// Last quarter's sales revenue.
    pub revenue: f64,
    /// Last quarter's net profit.
    pub profit: f64,
    /// Earnings before interest and tax.
    pub ebit: f64,
    /// EBIT plus depreciation.
    pub ebitda: f64,
    /// Units sold last quarter.
    pub units_sold: f64,
    /// Share of total market revenue, in `[0, 1]`.
    pub market_share: f64,
    /// EBIT over total assets, in percent.
    pub roi: f64,
    /// Cost lines of the last quarter.
    pub costs: CostBreakdown,
    /// Demand and stock-out detail of the last quarter.
    pub sales: SalesDetail,
    /// Margins and returns.
    pub profitability: ProfitabilityRatios,
    /// Turnover and productivity ratios.
    pub efficiency_ratios: EfficiencyRatios,
    /// Debt and equity ratios.
    pub leverage: LeverageRatios,
    /// Quarter-on-quarter growth rates.
    pub growth: GrowthMetrics,
    /// Liquidity ratios of the first to third degree.
    pub liquidity: Liquidity,
    /// Full profit and loss statement of the last quarter.
    pub income_statement: IncomeStatement,
    /// Contribution margin and break-even point.
    pub contribution: ContributionMargin,
    /// Revenue one quarter earlier.
    pub prev_revenue: f64,
    /// Profit one quarter earlier.
    pub prev_profit: f64,
    /// Market share one quarter earlier.
    pub prev_market_share: f64,

    /// Outstanding annuity loans, oldest first.
    pub loans: Vec<Loan>,
    /// Divides the base loan rate; higher is better.
    pub credit_rating: f64,
    /// Debt ceiling from total assets and the rating.
    pub max_loan_capacity: f64,

    /// Shareholder name → percent held in this firm.
    pub shares: BTreeMap<String, f64>,
    /// Target firm → percent this firm holds in it.
    pub portfolio: BTreeMap<FirmId, f64>,
    /// Listed firms can issue shares to the public float.
    pub is_public: bool,
    /// Intangible value counted in the enterprise value.
    pub brand_value: f64,
    /// Valuation recomputed every quarter.
    pub enterprise_value: f64,

    /// Quarters since launch or the last relaunch.
    pub product_age_quarters: u32,
    /// Stage derived from the product age.
    pub lifecycle_stage: LifecycleStage,
    /// Relaunches bought so far.
    pub innovation_level: u32,
    /// Spend carried towards the next relaunch.
    pub innovation_investment: f64,
    /// R&D spend accumulated towards the next quality level.
    pub rd_progress: f64,

    /// Last quarter this firm was closed for.
    pub current_quarter: u32,
    /// Wall-clock time of the last change.
    pub last_update: DateTime<Utc>,
    /// Per-quarter results, oldest first, capped.
    pub history: Vec<HistoryEntry>,

    /// Set once the firm is liquidated.
    pub is_bankrupt: bool,
    /// Liquidation outcome of a bankrupt firm.
    pub bankruptcy: Option<BankruptcyReport>,
}

impl Firm {
    /// Founds a firm owned entirely by its first user.
    pub fn new(id: FirmId, name: impl Into<String>, user: impl Into<String>) -> Self {
        let user = user.into();
        let mut shares = BTreeMap::new();
        shares.insert(user.clone(), 100.0);
        let assets = FixedAssets {
            buildings: START_BUILDINGS,
            machines: START_MACHINES,
            equipment: START_EQUIPMENT,
        };
        Self {
            id,
            name: name.into(),
            user_names: vec![user],
            cash: START_CASH,
            debt: 0.0,
            equity: START_EQUITY,
            retained_earnings: 0.0,
            product_price: START_PRICE,
            production_capacity: START_CAPACITY,
            marketing_budget: START_MARKETING,
            rd_budget: 0.0,
            quality_level: START_QUALITY,
            safety_stock: START_SAFETY_STOCK,
            efficiency_investment: EfficiencyInvestments::default(),
            depreciation_rates: DepreciationRates::default(),
            assets,
            machine_class: MachineClass::Basic,
            workforce: Workforce::new(START_UNSKILLED, START_SEMI_SKILLED, START_SKILLED),
            inventory_level: START_INVENTORY,
            efficiency: EfficiencyFactors::default(),
            efficiency_progress: EfficiencyInvestments::default(),
            revenue: 0.0,
            profit: 0.0,
            ebit: 0.0,
            ebitda: 0.0,
            units_sold: 0.0,
            market_share: 0.0,
            roi: 0.0,
            costs: CostBreakdown::default(),
            sales: SalesDetail::default(),
            profitability: ProfitabilityRatios::default(),
            efficiency_ratios: EfficiencyRatios::default(),
            leverage: LeverageRatios::default(),
            growth: GrowthMetrics::default(),
            liquidity: Liquidity::default(),
            income_statement: IncomeStatement::default(),
            contribution: ContributionMargin::default(),
            prev_revenue: 0.0,
            prev_profit: 0.0,
            prev_market_share: 0.0,
            loans: Vec::new(),
            credit_rating: 1.0,
            max_loan_capacity: (assets.total() + START_CASH) * LOAN_CAPACITY_ASSET_SHARE,
            shares,
            portfolio: BTreeMap::new(),
            is_public: false,
            brand_value: START_BRAND_VALUE,
            enterprise_value: 0.0,
            product_age_quarters: 0,
            lifecycle_stage: LifecycleStage::Introduction,
            innovation_level: 0,
            innovation_investment: 0.0,
            rd_progress: 0.0,
            current_quarter: 0,
            last_update: Utc::now(),
            history: Vec::new(),
            is_bankrupt: false,
            bankruptcy: None,
        }
    }

    /// Bots are recognised by the marker in one of their user identifiers.
    pub fn is_bot(&self) -> bool {
        let marker = BOT_MARKER.to_ascii_lowercase();
        self.user_names
            .iter()
            .any(|u| u.to_ascii_lowercase().contains(&marker))
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.user_names.iter().any(|u| u == user)
    }

    /// Adds a user; `false` if already a member.
    pub fn add_user(&mut self, user: impl Into<String>) -> bool {
        let user = user.into();
        if self.has_user(&user) {
            return false;
        }
        self.user_names.push(user);
        true
    }

    /// Current capacity ceiling from machines and workforce.
    pub fn max_capacity(&self) -> f64 {
        capacity::max_capacity(self.machine_class, &self.workforce)
    }

    /// Lowers committed production to the ceiling if it no longer fits.
    pub fn clamp_capacity_to_ceiling(&mut self) {
        let ceiling = self.max_capacity();
        if self.production_capacity > ceiling {
            self.production_capacity = ceiling;
        }
    }

    /// Inventory valued at material cost.
    pub fn inventory_value(&self) -> f64 {
        self.inventory_level * MATERIAL_COST_PER_UNIT
    }

    pub fn receivables(&self) -> f64 {
        self.revenue.max(0.0) * RECEIVABLES_RATE
    }

    /// Cash, receivables, inventory and fixed assets.
    pub fn total_assets(&self) -> f64 {
        self.cash + self.receivables() + self.inventory_value() + self.assets.total()
    }

    pub fn loan_principal(&self) -> f64 {
        self.loans.iter().map(|l| l.principal).sum()
    }

    /// Debt that is not represented by an explicit loan.
    pub fn legacy_debt(&self) -> f64 {
        (self.debt - self.loan_principal()).max(0.0)
    }

    /// Credit line still open under the current loan capacity.
    pub fn available_credit(&self) -> f64 {
        (self.max_loan_capacity - self.debt).max(0.0)
    }

    /// Annual rate quoted to this firm for a new loan.
    pub fn quoted_loan_rate(&self) -> f64 {
        BASE_ANNUAL_LOAN_RATE / self.credit_rating.clamp(MIN_CREDIT_RATING, MAX_CREDIT_RATING)
    }

    pub fn shares_total(&self) -> f64 {
        self.shares.values().sum()
    }

    /// Moves `pct` percent of this firm to `buyer`, taken pro rata from every
    /// other holder.
    pub fn transfer_shares(&mut self, buyer: &str, pct: f64) -> Result<(), BusinessError> {
        if !(pct.is_finite() && pct > 0.0) {
            return Err(BusinessError::InvalidAmount);
        }
        let available: f64 = self
            .shares
            .iter()
            .filter(|(holder, _)| holder.as_str() != buyer)
            .map(|(_, p)| *p)
            .sum();
        if pct > available + SHARE_EPSILON {
            return Err(BusinessError::InsufficientShares {
                requested: pct,
                available,
            });
        }
        let fraction = (pct / available).min(1.0);
        for (holder, held) in self.shares.iter_mut() {
            if holder.as_str() != buyer {
                *held -= *held * fraction;
            }
        }
        self.shares.retain(|_, p| *p > SHARE_EPSILON);
        *self.shares.entry(buyer.to_string()).or_insert(0.0) += pct;
        Ok(())
    }

    /// Appends a history entry, evicting the oldest past the cap.
    pub fn push_history(&mut self, entry: HistoryEntry, cap: usize) {
        self.history.push(entry);
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }
    }

    /// Stores this quarter's market share and its growth against the last one.
    pub fn record_market_share(&mut self, share: f64) {
        let share = if share.is_finite() {
            share.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.prev_market_share = self.market_share;
        self.growth.market_share_growth = if self.prev_market_share > 0.0 {
            (share - self.prev_market_share) / self.prev_market_share * 100.0
        } else {
            0.0
        };
        self.market_share = share;
        if let Some(last) = self.history.last_mut() {
            if last.quarter == self.current_quarter {
                last.market_share = share;
            }
        }
    }

    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            quarter: self.current_quarter,
            revenue: self.revenue,
            profit: self.profit,
            cash: self.cash,
            roi: self.roi,
            market_share: self.market_share,
            units_sold: self.units_sold,
        }
    }
}

/// Validate a firm record against the ledger invariants.
pub fn validate_firm(firm: &Firm) -> Result<(), ValidationError> {
    if firm.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let finite = [
        ("cash", firm.cash),
        ("debt", firm.debt),
        ("equity", firm.equity),
        ("inventory_level", firm.inventory_level),
        ("production_capacity", firm.production_capacity),
        ("product_price", firm.product_price),
        ("revenue", firm.revenue),
        ("profit", firm.profit),
        ("buildings", firm.assets.buildings),
        ("machines", firm.assets.machines),
        ("equipment", firm.assets.equipment),
    ];
    for (field, value) in finite {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(field));
        }
    }
    if firm.debt < 0.0 {
        return Err(ValidationError::NegativeMoney("debt"));
    }
    if firm.inventory_level < 0.0 {
        return Err(ValidationError::NegativeMoney("inventory_level"));
    }
    if firm.assets.buildings < 0.0 || firm.assets.machines < 0.0 || firm.assets.equipment < 0.0 {
        return Err(ValidationError::NegativeMoney("assets"));
    }
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&firm.quality_level) {
        return Err(ValidationError::OutOfRange {
            field: "quality_level",
            min: MIN_QUALITY as f64,
            max: MAX_QUALITY as f64,
        });
    }
    if !(0.0..=1.0).contains(&firm.safety_stock) {
        return Err(ValidationError::OutOfRange {
            field: "safety_stock",
            min: 0.0,
            max: 1.0,
        });
    }
    let ceiling = firm.max_capacity();
    if firm.production_capacity > ceiling + 1e-6 {
        return Err(ValidationError::CapacityAboveCeiling {
            committed: firm.production_capacity,
            ceiling,
        });
    }
    let total = firm.shares_total();
    if total > 100.0 + SHARE_EPSILON {
        return Err(ValidationError::SharesOverAllocated(total));
    }
    Ok(())
}
