//! Ratio suite recomputed at every quarter close.
//!
//! Every division is guarded: a zero or non-finite denominator yields `0.0`,
//! or `None` where an unbounded ratio is meaningful (liquidity, interest
//! coverage).

use sim_core::model::*;
use sim_core::params::*;
use sim_core::Firm;

/// Figures of the quarter just calculated, before the state advance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuarterFigures {
    pub revenue: f64,
    pub units_sold: f64,
    pub production: f64,
    /// Materials, production, energy and inventory holding.
    pub variable_costs: f64,
    /// Materials, production and energy per unit.
    pub unit_variable_cost: f64,
    pub unit_price: f64,
    pub personnel: f64,
    pub overhead: f64,
    pub depreciation: f64,
    pub marketing: f64,
    pub rd: f64,
    pub ebit: f64,
    pub interest: f64,
    pub net_profit: f64,
    pub opening_inventory: f64,
    pub closing_inventory: f64,
}

pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        return 0.0;
    }
    num / den
}

fn percent(num: f64, den: f64) -> f64 {
    ratio(num, den) * 100.0
}

pub fn profitability(f: &QuarterFigures, equity: f64, total_assets: f64) -> ProfitabilityRatios {
    let gross = f.revenue - f.variable_costs;
    let direct = f.unit_variable_cost * f.production;
    ProfitabilityRatios {
        ebitda: f.ebit + f.depreciation,
        gross_margin: percent(gross, f.revenue),
        operating_margin: percent(f.ebit, f.revenue),
        net_margin: percent(f.net_profit, f.revenue),
        contribution_margin: percent(f.revenue - direct, f.revenue),
        roe: if equity > 0.0 { percent(f.net_profit, equity) } else { 0.0 },
        roa: if total_assets > 0.0 { percent(f.net_profit, total_assets) } else { 0.0 },
    }
}

pub fn efficiency(f: &QuarterFigures, total_assets: f64, ceiling: f64) -> EfficiencyRatios {
    let avg_inventory_value =
        (f.opening_inventory + f.closing_inventory) / 2.0 * MATERIAL_COST_PER_UNIT;
    EfficiencyRatios {
        asset_turnover: if total_assets > 0.0 { ratio(f.revenue, total_assets) } else { 0.0 },
        inventory_turnover: if avg_inventory_value > 0.0 {
            ratio(f.variable_costs, avg_inventory_value)
        } else {
            0.0
        },
        capacity_utilization: percent(f.production, ceiling),
    }
}

pub fn leverage(debt: f64, equity: f64, total_assets: f64, ebit: f64, interest: f64) -> LeverageRatios {
    let interest_coverage = if interest > 0.0 {
        Some(ratio(ebit, interest))
    } else if ebit > 0.0 {
        None
    } else {
        Some(0.0)
    };
    LeverageRatios {
        debt_to_equity: if equity > 0.0 { ratio(debt, equity) } else { 0.0 },
        equity_ratio: if total_assets > 0.0 { percent(equity, total_assets) } else { 0.0 },
        debt_ratio: if total_assets > 0.0 { percent(debt, total_assets) } else { 0.0 },
        interest_coverage,
    }
}

/// Quarter-on-quarter growth in percent. Profit growth against a zero base
/// reports 100% for any non-zero result.
pub fn growth(prev_revenue: f64, prev_profit: f64, revenue: f64, profit: f64) -> (f64, f64) {
    let revenue_growth = if prev_revenue > 0.0 {
        percent(revenue - prev_revenue, prev_revenue)
    } else {
        0.0
    };
    let profit_growth = if prev_profit != 0.0 {
        percent(profit - prev_profit, prev_profit.abs())
    } else if profit == 0.0 {
        0.0
    } else {
        100.0
    };
    (revenue_growth, profit_growth)
}

/// Current liabilities: the next four instalments of every loan plus all
/// legacy debt.
pub fn current_liabilities(firm: &Firm) -> f64 {
    let instalments: f64 = firm
        .loans
        .iter()
        .map(|l| l.quarterly_payment * l.quarters_remaining.min(4) as f64)
        .sum();
    instalments + firm.legacy_debt()
}

pub fn liquidity(firm: &Firm) -> Liquidity {
    let liabilities = current_liabilities(firm);
    let receivables = firm.receivables();
    let cash = firm.cash;
    let (l1, l2, l3) = if liabilities > 0.0 {
        (
            Some(cash / liabilities),
            Some((cash + receivables) / liabilities),
            Some((cash + receivables + firm.inventory_value()) / liabilities),
        )
    } else {
        (None, None, None)
    };
    Liquidity {
        liquidity_1: l1,
        liquidity_2: l2,
        liquidity_3: l3,
        current_liabilities: liabilities,
        receivables,
    }
}

pub fn contribution(f: &QuarterFigures) -> ContributionMargin {
    let unit_contribution = f.unit_price - f.unit_variable_cost;
    let fixed = f.personnel + f.overhead + f.depreciation + f.marketing + f.rd;
    ContributionMargin {
        unit_price: f.unit_price,
        unit_variable_cost: f.unit_variable_cost,
        unit_contribution,
        total_contribution: unit_contribution * f.units_sold,
        contribution_ratio: percent(unit_contribution, f.unit_price),
        break_even_units: if unit_contribution > 0.0 {
            Some(fixed / unit_contribution)
        } else {
            None
        },
    }
}

/// Rating in `[0.5, 1.5]` from equity ratio, cash liquidity, gearing and the
/// last result.
pub fn credit_rating(firm: &Firm) -> f64 {
    let mut rating: f64 = 1.0;
    let equity_ratio = firm.leverage.equity_ratio;
    if equity_ratio >= 50.0 {
        rating += 0.2;
    } else if equity_ratio >= 30.0 {
        rating += 0.1;
    } else if equity_ratio < 15.0 {
        rating -= 0.2;
    }
    match firm.liquidity.liquidity_1 {
        None => rating += 0.1,
        Some(l) if l >= 1.5 => rating += 0.1,
        Some(l) if l < 0.5 => rating -= 0.2,
        Some(_) => {}
    }
    if firm.leverage.debt_to_equity > 2.0 {
        rating -= 0.2;
    }
    if firm.profit > 0.0 {
        rating += 0.1;
    } else if firm.profit < 0.0 {
        rating -= 0.1;
    }
    rating.clamp(MIN_CREDIT_RATING, MAX_CREDIT_RATING)
}

/// Borrowing ceiling: half of total assets, scaled by the credit rating.
pub fn max_loan_capacity(firm: &Firm) -> f64 {
    (firm.total_assets() * LOAN_CAPACITY_ASSET_SHARE * firm.credit_rating).max(0.0)
}
