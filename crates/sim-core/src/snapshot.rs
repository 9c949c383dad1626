//! Wire snapshots of firm state.
//!
//! Field names and nesting follow the dashboard's JSON contract. Money is
//! rounded to cents, shares and turnover ratios to four places, and
//! `safety_stock_percentage` is reported in percent.

use crate::capacity;
use crate::firm::Firm;
use crate::model::*;
use crate::money::{round2, round_dp, round_opt};
use crate::params::{INNOVATION_THRESHOLD, LOT_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetsView {
    pub buildings: f64,
    pub machines: f64,
    pub equipment: f64,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergersView {
    pub enterprise_value: f64,
    pub brand_value: f64,
    pub is_public: bool,
    /// Shareholder → percent of this firm.
    pub shareholders: BTreeMap<String, f64>,
    /// Firm id → percent held in that firm.
    pub portfolio: BTreeMap<FirmId, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachinesView {
    pub class: MachineClass,
    pub efficiency_factor: f64,
    pub energy_cost_factor: f64,
    pub next_class: Option<MachineClass>,
    pub upgrade_cost: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionView {
    pub max_capacity: f64,
    pub committed_capacity: f64,
    /// Percent of the ceiling committed.
    pub capacity_usage: f64,
    pub lot_size: f64,
    pub efficiency: EfficiencyFactors,
    pub efficiency_progress: EfficiencyInvestments,
    pub pending_efficiency_investment: EfficiencyInvestments,
    pub depreciation_rates: DepreciationRates,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonnelView {
    pub unskilled: u32,
    pub semi_skilled: u32,
    pub skilled: u32,
    pub total: u32,
    pub quarterly_cost: f64,
    pub weighted_productivity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancingView {
    pub loans: Vec<Loan>,
    pub total_loan_principal: f64,
    pub legacy_debt: f64,
    pub credit_rating: f64,
    pub max_loan_capacity: f64,
    pub available_credit: f64,
    pub quoted_annual_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiquidityView {
    /// `None` when there are no current liabilities.
    pub liquidity_1: Option<f64>,
    pub liquidity_2: Option<f64>,
    pub liquidity_3: Option<f64>,
    pub current_liabilities: f64,
    pub receivables: f64,
    pub status: LiquidityStatus,
    pub recommendation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub age_quarters: u32,
    pub lifecycle_stage: LifecycleStage,
    pub demand_factor: f64,
    pub innovation_level: u32,
    pub innovation_investment: f64,
    /// Spend still needed for the next innovation level.
    pub next_innovation_in: f64,
    pub quality_level: u8,
    pub rd_progress: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub buildings: f64,
    pub machines: f64,
    pub equipment: f64,
    pub fixed_assets: f64,
    pub inventory: f64,
    pub receivables: f64,
    pub cash: f64,
    pub current_assets: f64,
    pub total_assets: f64,
    pub equity: f64,
    pub retained_earnings: f64,
    pub long_term_debt: f64,
    pub current_liabilities: f64,
    pub total_liabilities: f64,
}

impl BalanceSheet {
    pub fn of(firm: &Firm) -> Self {
        let fixed = firm.assets.total();
        let inventory = firm.inventory_value();
        let receivables = firm.receivables();
        let current_assets = firm.cash + receivables + inventory;
        let current_liabilities = firm.liquidity.current_liabilities.min(firm.debt.max(0.0));
        let long_term_debt = (firm.debt - current_liabilities).max(0.0);
        Self {
            buildings: firm.assets.buildings,
            machines: firm.assets.machines,
            equipment: firm.assets.equipment,
            fixed_assets: fixed,
            inventory,
            receivables,
            cash: firm.cash,
            current_assets,
            total_assets: fixed + current_assets,
            equity: firm.equity,
            retained_earnings: firm.retained_earnings,
            long_term_debt,
            current_liabilities,
            total_liabilities: long_term_debt + current_liabilities,
        }
    }
}

/// Full JSON-facing view of a firm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirmSnapshot {
    /// Firm id.
    pub id: FirmId,
    /// Display name.
    pub name: String,
    /// Players steering the firm.
    pub user_names: Vec<String>,
    /// Whether the firm is run by the bot engine.
    pub is_bot: bool,
    /// Whether the firm has been liquidated.
    pub is_bankrupt: bool,
    /// Cash on hand.
    pub cash: f64,
    /// Loan principal plus legacy debt.
    pub debt: f64,
    /// Book equity.
    pub equity: f64,
    /// Cumulative net profit kept in the firm.
    pub retained_earnings: f64,
    /// Last quarter's revenue.
    pub revenue: f64,
    /// Last quarter's net profit.
    pub profit: f64,
    /// Last quarter's EBIT.
    pub ebit: f64,
    /// Share of market revenue, four places.
    pub market_share: f64,
    /// EBIT over total assets, in percent.
    pub roi: f64,
    /// Units sold last quarter.
    pub units_sold: f64,
    /// Current unit price.
    pub product_price: f64,
    /// Committed production.
    pub production_capacity: f64,
    /// Finished units in stock.
    pub inventory_level: f64,
    /// Safety stock in percent.
    pub safety_stock_percentage: f64,
    /// Marketing spend for the coming quarter.
    pub marketing_budget: f64,
    /// R&D spend for the coming quarter.
    pub rd_budget: f64,
    /// Product quality, 1 to 10.
    pub quality_level: u8,
    /// Last closed quarter.
    pub current_quarter: u32,
    /// Fixed asset book values.
    pub assets: AssetsView,
    /// Cost lines of the last quarter.
    pub costs: CostBreakdown,
    /// Margins and returns.
    pub profitability_ratios: ProfitabilityRatios,
    /// Turnover and productivity ratios.
    pub efficiency_ratios: EfficiencyRatios,
    /// Debt and equity ratios.
    pub leverage_ratios: LeverageRatios,
    /// Quarter-on-quarter growth.
    pub growth_metrics: GrowthMetrics,
    /// Valuation, cap table and holdings.
    pub m_and_a: MergersView,
    /// Machine class and the next upgrade.
    pub machines: MachinesView,
    /// Capacity ceiling, efficiency and depreciation settings.
    pub production: ProductionView,
    /// Headcount and wage cost.
    pub personnel: PersonnelView,
    /// Loans and credit terms.
    pub financing: FinancingView,
    /// Liquidity ratios and advice.
    pub liquidity: LiquidityView,
    /// Lifecycle, innovation and quality progress.
    pub product: ProductView,
    /// Balance sheet at the end of the last quarter.
    pub balance_sheet: BalanceSheet,
    /// Profit and loss of the last quarter.
    pub income_statement: IncomeStatement,
    /// Contribution margin and break-even point.
    pub contribution_margin: ContributionMargin,
    /// Per-quarter results, oldest first.
    pub history: Vec<HistoryEntry>,
}

/// One row of the market overview, sorted by market share.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub id: FirmId,
    pub name: String,
    pub user_names: Vec<String>,
    pub is_bot: bool,
    pub market_share: f64,
    pub revenue: f64,
    pub profit: f64,
    pub cash: f64,
    pub product_price: f64,
    pub quality_level: u8,
}

/// Compact row used by firm pickers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirmListing {
    pub id: FirmId,
    pub name: String,
    pub user_count: usize,
    pub market_share: f64,
    pub cash: f64,
}

fn r4(v: f64) -> f64 {
    round_dp(v, 4)
}

impl CostBreakdown {
    fn rounded(&self) -> Self {
        Self {
            variable: round2(self.variable),
            energy: round2(self.energy),
            inventory: round2(self.inventory),
            personnel: round2(self.personnel),
            depreciation: round2(self.depreciation),
            overhead: round2(self.overhead),
            marketing: round2(self.marketing),
            rd: round2(self.rd),
            interest: round2(self.interest),
            total: round2(self.total),
        }
    }
}

impl IncomeStatement {
    fn rounded(&self) -> Self {
        Self {
            revenue: round2(self.revenue),
            variable_costs: round2(self.variable_costs),
            gross_profit: round2(self.gross_profit),
            personnel: round2(self.personnel),
            overhead: round2(self.overhead),
            depreciation: round2(self.depreciation),
            marketing: round2(self.marketing),
            rd: round2(self.rd),
            ebit: round2(self.ebit),
            interest: round2(self.interest),
            ebt: round2(self.ebt),
            taxes: round2(self.taxes),
            net_profit: round2(self.net_profit),
        }
    }
}

impl BalanceSheet {
    fn rounded(&self) -> Self {
        Self {
            buildings: round2(self.buildings),
            machines: round2(self.machines),
            equipment: round2(self.equipment),
            fixed_assets: round2(self.fixed_assets),
            inventory: round2(self.inventory),
            receivables: round2(self.receivables),
            cash: round2(self.cash),
            current_assets: round2(self.current_assets),
            total_assets: round2(self.total_assets),
            equity: round2(self.equity),
            retained_earnings: round2(self.retained_earnings),
            long_term_debt: round2(self.long_term_debt),
            current_liabilities: round2(self.current_liabilities),
            total_liabilities: round2(self.total_liabilities),
        }
    }
}

impl Firm {
    /// Nested, rounded view of the firm for the API and dashboard.
    pub fn to_snapshot(&self) -> FirmSnapshot {
        let max_capacity = self.max_capacity();
        let liquidity_status = self.liquidity.status();
        let unlimited = self.liquidity.liquidity_1.is_none();
        let p = &self.profitability;
        let e = &self.efficiency_ratios;
        let l = &self.leverage;
        let g = &self.growth;
        let c = &self.contribution;

        FirmSnapshot {
            id: self.id,
            name: self.name.clone(),
            user_names: self.user_names.clone(),
            is_bot: self.is_bot(),
            is_bankrupt: self.is_bankrupt,
            cash: round2(self.cash),
            debt: round2(self.debt),
            equity: round2(self.equity),
            retained_earnings: round2(self.retained_earnings),
            revenue: round2(self.revenue),
            profit: round2(self.profit),
            ebit: round2(self.ebit),
            market_share: r4(self.market_share),
            roi: round2(self.roi),
            units_sold: round2(self.units_sold),
            product_price: round2(self.product_price),
            production_capacity: round2(self.production_capacity),
            inventory_level: round2(self.inventory_level),
            safety_stock_percentage: round_dp(self.safety_stock * 100.0, 1),
            marketing_budget: round2(self.marketing_budget),
            rd_budget: round2(self.rd_budget),
            quality_level: self.quality_level,
            current_quarter: self.current_quarter,
            assets: AssetsView {
                buildings: round2(self.assets.buildings),
                machines: round2(self.assets.machines),
                equipment: round2(self.assets.equipment),
                total: round2(self.assets.total()),
            },
            costs: self.costs.rounded(),
            profitability_ratios: ProfitabilityRatios {
                ebitda: round2(p.ebitda),
                gross_margin: round2(p.gross_margin),
                operating_margin: round2(p.operating_margin),
                net_margin: round2(p.net_margin),
                contribution_margin: round2(p.contribution_margin),
                roe: round2(p.roe),
                roa: round2(p.roa),
            },
            efficiency_ratios: EfficiencyRatios {
                asset_turnover: r4(e.asset_turnover),
                inventory_turnover: round2(e.inventory_turnover),
                capacity_utilization: round2(e.capacity_utilization),
            },
            leverage_ratios: LeverageRatios {
                debt_to_equity: r4(l.debt_to_equity),
                equity_ratio: round2(l.equity_ratio),
                debt_ratio: round2(l.debt_ratio),
                interest_coverage: round_opt(l.interest_coverage, 2),
            },
            growth_metrics: GrowthMetrics {
                revenue_growth: round2(g.revenue_growth),
                profit_growth: round2(g.profit_growth),
                market_share_growth: round2(g.market_share_growth),
            },
            m_and_a: MergersView {
                enterprise_value: round2(self.enterprise_value),
                brand_value: round2(self.brand_value),
                is_public: self.is_public,
                shareholders: self.shares.iter().map(|(k, v)| (k.clone(), round2(*v))).collect(),
                portfolio: self.portfolio.iter().map(|(k, v)| (*k, round2(*v))).collect(),
            },
            machines: MachinesView {
                class: self.machine_class,
                efficiency_factor: self.machine_class.efficiency_factor(),
                energy_cost_factor: self.machine_class.energy_cost_factor(),
                next_class: self.machine_class.next(),
                upgrade_cost: self.machine_class.upgrade_cost(),
            },
            production: ProductionView {
                max_capacity: round2(max_capacity),
                committed_capacity: round2(self.production_capacity),
                capacity_usage: if max_capacity > 0.0 {
                    round2(self.production_capacity / max_capacity * 100.0)
                } else {
                    0.0
                },
                lot_size: LOT_SIZE,
                efficiency: EfficiencyFactors {
                    process: r4(self.efficiency.process),
                    supplier: r4(self.efficiency.supplier),
                    overhead: r4(self.efficiency.overhead),
                },
                efficiency_progress: self.efficiency_progress,
                pending_efficiency_investment: self.efficiency_investment,
                depreciation_rates: self.depreciation_rates,
            },
            personnel: PersonnelView {
                unskilled: self.workforce.unskilled,
                semi_skilled: self.workforce.semi_skilled,
                skilled: self.workforce.skilled,
                total: self.workforce.total(),
                quarterly_cost: round2(self.workforce.quarterly_cost()),
                weighted_productivity: r4(capacity::weighted_productivity(&self.workforce)),
            },
            financing: FinancingView {
                loans: self
                    .loans
                    .iter()
                    .map(|loan| Loan {
                        principal: round2(loan.principal),
                        annual_rate: r4(loan.annual_rate),
                        quarters_remaining: loan.quarters_remaining,
                        quarterly_payment: round2(loan.quarterly_payment),
                    })
                    .collect(),
                total_loan_principal: round2(self.loan_principal()),
                legacy_debt: round2(self.legacy_debt()),
                credit_rating: round2(self.credit_rating),
                max_loan_capacity: round2(self.max_loan_capacity),
                available_credit: round2(self.available_credit()),
                quoted_annual_rate: r4(self.quoted_loan_rate()),
            },
            liquidity: LiquidityView {
                liquidity_1: round_opt(self.liquidity.liquidity_1, 2),
                liquidity_2: round_opt(self.liquidity.liquidity_2, 2),
                liquidity_3: round_opt(self.liquidity.liquidity_3, 2),
                current_liabilities: round2(self.liquidity.current_liabilities),
                receivables: round2(self.liquidity.receivables),
                status: liquidity_status,
                recommendation: liquidity_status.recommendation(unlimited).to_string(),
            },
            product: ProductView {
                age_quarters: self.product_age_quarters,
                lifecycle_stage: self.lifecycle_stage,
                demand_factor: self.lifecycle_stage.demand_factor(),
                innovation_level: self.innovation_level,
                innovation_investment: round2(self.innovation_investment),
                next_innovation_in: round2((INNOVATION_THRESHOLD - self.innovation_investment).max(0.0)),
                quality_level: self.quality_level,
                rd_progress: round2(self.rd_progress),
            },
            balance_sheet: BalanceSheet::of(self).rounded(),
            income_statement: self.income_statement.rounded(),
            contribution_margin: ContributionMargin {
                unit_price: round2(c.unit_price),
                unit_variable_cost: round2(c.unit_variable_cost),
                unit_contribution: round2(c.unit_contribution),
                total_contribution: round2(c.total_contribution),
                contribution_ratio: round2(c.contribution_ratio),
                break_even_units: round_opt(c.break_even_units, 0),
            },
            history: self.history.clone(),
        }
    }

    pub fn market_entry(&self) -> MarketEntry {
        MarketEntry {
            id: self.id,
            name: self.name.clone(),
            user_names: self.user_names.clone(),
            is_bot: self.is_bot(),
            market_share: r4(self.market_share),
            revenue: round2(self.revenue),
            profit: round2(self.profit),
            cash: round2(self.cash),
            product_price: round2(self.product_price),
            quality_level: self.quality_level,
        }
    }

    pub fn listing(&self) -> FirmListing {
        FirmListing {
            id: self.id,
            name: self.name.clone(),
            user_count: self.user_names.len(),
            market_share: r4(self.market_share),
            cash: round2(self.cash),
        }
    }
}
