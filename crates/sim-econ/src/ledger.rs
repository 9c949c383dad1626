//! Firm ledger: turns a quarter's decisions into results.
//!
//! `calculate_quarterly_results` runs a fixed pipeline:
//! 1. demand and sales
//! 2. cost components
//! 3. profit chain (gross profit, EBIT, EBT, tax, net profit)
//! 4. ratio suite against the previous quarter
//! 5. state advance (cash, inventory, assets, loans, programmes, product,
//!    quality, credit and valuation)
//!
//! Only the firm passed in is touched. A bankrupt firm is left as is.

use crate::costs;
use crate::demand;
use crate::financing;
use crate::operations;
use crate::ratios::{self, QuarterFigures};
use crate::valuation;
use chrono::Utc;
use sim_core::model::{CostBreakdown, IncomeStatement, QuarterResults};
use sim_core::params::TAX_RATE;
use sim_core::Firm;
use tracing::debug;

/// Calculates one quarter for `firm`, updates it and returns the results.
pub fn calculate_quarterly_results(firm: &mut Firm) -> QuarterResults {
    if firm.is_bankrupt {
        return QuarterResults {
            quarter: firm.current_quarter,
            cash: firm.cash,
            inventory: firm.inventory_level,
            ..QuarterResults::default()
        };
    }

    // 1. demand
    let sales = demand::compute_sales(firm);
    let units_sold = sales.units_sold;
    let revenue = units_sold * sales.effective_price;
    let production = firm.production_capacity.max(0.0);

    // 2. costs
    let unit_variable = costs::unit_variable_cost(firm);
    let unit_energy = costs::unit_energy_cost(firm);
    let variable = production * unit_variable;
    let energy = production * unit_energy;
    let inventory_cost = costs::inventory_holding_cost(firm);
    let personnel = firm.workforce.quarterly_cost();
    let depreciation = costs::depreciation_charges(firm);
    let overhead = costs::overhead_cost(firm);
    let marketing = firm.marketing_budget.max(0.0);
    let rd = firm.rd_budget.max(0.0);
    let interest = costs::interest_cost(firm);
    let cost_of_goods = variable + energy + inventory_cost;

    // 3. profit chain
    let gross_profit = revenue - cost_of_goods;
    let ebit = gross_profit - overhead - personnel - depreciation.total() - marketing - rd;
    let ebt = ebit - interest;
    let taxes = (ebt * TAX_RATE).max(0.0);
    let net_profit = ebt - taxes;

    let cost_breakdown = CostBreakdown {
        variable,
        energy,
        inventory: inventory_cost,
        personnel,
        depreciation: depreciation.total(),
        overhead,
        marketing,
        rd,
        interest,
        total: cost_of_goods + personnel + depreciation.total() + overhead + marketing + rd + interest,
    };

    // 4. ratio suite
    let opening_inventory = firm.inventory_level.max(0.0);
    let closing_inventory = (opening_inventory + production - units_sold).max(0.0);
    let figures = QuarterFigures {
        revenue,
        units_sold,
        production,
        variable_costs: cost_of_goods,
        unit_variable_cost: unit_variable + unit_energy,
        unit_price: sales.effective_price,
        personnel,
        overhead,
        depreciation: depreciation.total(),
        marketing,
        rd,
        ebit,
        interest,
        net_profit,
        opening_inventory,
        closing_inventory,
    };
    let total_assets = firm.total_assets();
    firm.profitability = ratios::profitability(&figures, firm.equity, total_assets);
    firm.efficiency_ratios = ratios::efficiency(&figures, total_assets, firm.max_capacity());
    firm.leverage = ratios::leverage(firm.debt, firm.equity, total_assets, ebit, interest);
    let (revenue_growth, profit_growth) =
        ratios::growth(firm.prev_revenue, firm.prev_profit, revenue, net_profit);
    firm.growth.revenue_growth = revenue_growth;
    firm.growth.profit_growth = profit_growth;
    firm.contribution = ratios::contribution(&figures);
    firm.income_statement = IncomeStatement {
        revenue,
        variable_costs: cost_of_goods,
        gross_profit,
        personnel,
        overhead,
        depreciation: depreciation.total(),
        marketing,
        rd,
        ebit,
        interest,
        ebt,
        taxes,
        net_profit,
    };

    firm.revenue = revenue;
    firm.profit = net_profit;
    firm.ebit = ebit;
    firm.ebitda = ebit + depreciation.total();
    firm.units_sold = units_sold;
    firm.costs = cost_breakdown.clone();
    firm.sales = sales.clone();
    firm.prev_revenue = revenue;
    firm.prev_profit = net_profit;

    // 5. state advance
    firm.cash += net_profit;
    firm.equity += net_profit;
    firm.retained_earnings += net_profit;
    firm.inventory_level = closing_inventory;
    firm.assets.buildings = (firm.assets.buildings - depreciation.buildings).max(0.0);
    firm.assets.machines = (firm.assets.machines - depreciation.machines).max(0.0);
    firm.assets.equipment = (firm.assets.equipment - depreciation.equipment).max(0.0);
    financing::amortize_loans(firm);
    operations::apply_efficiency_programmes(firm);
    operations::advance_lifecycle(firm);
    operations::apply_research(firm);

    let total_assets = firm.total_assets();
    firm.roi = if total_assets > 0.0 {
        ebit / total_assets * 100.0
    } else {
        0.0
    };
    financing::refresh_credit(firm);
    firm.enterprise_value = valuation::enterprise_value(firm);
    firm.current_quarter += 1;
    firm.last_update = Utc::now();

    debug!(
        firm = %firm.id,
        quarter = firm.current_quarter,
        revenue,
        profit = net_profit,
        cash = firm.cash,
        "quarter calculated"
    );

    QuarterResults {
        quarter: firm.current_quarter,
        revenue,
        profit: net_profit,
        ebit,
        cash: firm.cash,
        inventory: firm.inventory_level,
        roi: firm.roi,
        market_share: firm.market_share,
        costs: cost_breakdown,
        sales,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisions::{apply_decisions, DecisionBundle};
    use proptest::prelude::*;
    use sim_core::model::{FirmId, LifecycleStage, MachineClass, Workforce};
    use sim_core::params::*;

    fn start_firm() -> Firm {
        let mut firm = Firm::new(FirmId(1), "Acme", "alice");
        apply_decisions(
            &mut firm,
            &DecisionBundle {
                price: 120.0,
                capacity: 40_000.0,
                marketing: 30_000.0,
                rd: 0.0,
                quality: 5,
                safety_stock_pct: 20.0,
                efficiency: None,
                depreciation: None,
            },
        );
        firm
    }

    #[test]
    fn first_quarter_of_a_fresh_firm() {
        let mut firm = start_firm();
        let r = calculate_quarterly_results(&mut firm);
        assert!(r.revenue.is_finite() && r.profit.is_finite());
        assert!(r.profit > 0.0);
        assert!((firm.cash - (START_CASH + r.profit)).abs() < 1e-6);
        let expected_inventory = (START_INVENTORY + 40_000.0 - r.sales.units_sold).max(0.0);
        assert!((firm.inventory_level - expected_inventory).abs() < 1e-6);
        assert_eq!(r.quarter, 1);
        assert_eq!(firm.product_age_quarters, 1);
        assert!(firm.assets.total() < START_BUILDINGS + START_MACHINES + START_EQUIPMENT);
        assert!((firm.equity - (START_EQUITY + r.profit)).abs() < 1e-6);
    }

    #[test]
    fn profit_chain_adds_up() {
        let mut firm = start_firm();
        firm.debt = 2_000_000.0;
        let r = calculate_quarterly_results(&mut firm);
        let is = &firm.income_statement;
        assert!((is.gross_profit - (is.revenue - is.variable_costs)).abs() < 1e-6);
        let ebit = is.gross_profit - is.overhead - is.personnel - is.depreciation - is.marketing - is.rd;
        assert!((is.ebit - ebit).abs() < 1e-6);
        assert!((is.ebt - (is.ebit - is.interest)).abs() < 1e-6);
        assert!((is.interest - 50_000.0).abs() < 1e-6);
        assert!((is.net_profit - r.profit).abs() < 1e-9);
        assert!(is.taxes >= 0.0);
    }

    #[test]
    fn losses_are_untaxed() {
        let mut firm = start_firm();
        firm.product_price = MAX_PRICE;
        calculate_quarterly_results(&mut firm);
        assert!(firm.income_statement.ebt < 0.0);
        assert_eq!(firm.income_statement.taxes, 0.0);
        assert!((firm.profit - firm.income_statement.ebt).abs() < 1e-9);
    }

    #[test]
    fn idle_firm_has_zero_sentinels() {
        let mut firm = start_firm();
        firm.production_capacity = 0.0;
        firm.inventory_level = 0.0;
        firm.workforce = Workforce::default();
        let r = calculate_quarterly_results(&mut firm);
        assert_eq!(r.revenue, 0.0);
        assert_eq!(firm.profitability.gross_margin, 0.0);
        assert_eq!(firm.efficiency_ratios.capacity_utilization, 0.0);
        assert_eq!(firm.contribution.total_contribution, 0.0);
        assert!(firm.cash.is_finite());
    }

    #[test]
    fn bankrupt_firm_is_frozen() {
        let mut firm = start_firm();
        firm.is_bankrupt = true;
        firm.cash = -10.0;
        let r = calculate_quarterly_results(&mut firm);
        assert_eq!(firm.cash, -10.0);
        assert_eq!(r.revenue, 0.0);
        assert_eq!(firm.current_quarter, 0);
    }

    #[test]
    fn lifecycle_advances_with_age() {
        let mut firm = start_firm();
        for _ in 0..GROWTH_STAGE_FROM {
            calculate_quarterly_results(&mut firm);
        }
        assert_eq!(firm.lifecycle_stage, LifecycleStage::Growth);
    }

    #[test]
    fn loans_run_off_through_the_ledger() {
        let mut firm = start_firm();
        financing::take_loan(&mut firm, 1_000_000.0, Some(2)).unwrap();
        calculate_quarterly_results(&mut firm);
        assert_eq!(firm.loans[0].quarters_remaining, 1);
        assert!(firm.costs.interest > 0.0);
        calculate_quarterly_results(&mut firm);
        assert!(firm.loans.is_empty());
        assert!(firm.debt.abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn ledger_never_produces_nan(
            price in 50.0f64..500.0,
            capacity_share in 0.0f64..1.0,
            marketing in 0.0f64..1_500_000.0,
            rd in 0.0f64..1_000_000.0,
            quality in 1i32..=10,
            safety in 0.0f64..100.0,
            premium in proptest::bool::ANY,
            inventory in 0.0f64..200_000.0,
        ) {
            let mut firm = Firm::new(FirmId(1), "Acme", "alice");
            if premium {
                firm.machine_class = MachineClass::Premium;
            }
            firm.inventory_level = inventory;
            let b = DecisionBundle {
                price,
                capacity: firm.max_capacity() * capacity_share,
                marketing,
                rd,
                quality,
                safety_stock_pct: safety,
                efficiency: None,
                depreciation: None,
            };
            apply_decisions(&mut firm, &b);
            let opening = firm.inventory_level;
            let committed = firm.production_capacity;
            let r = calculate_quarterly_results(&mut firm);
            prop_assert!(firm.cash.is_finite());
            prop_assert!(firm.inventory_level >= 0.0);
            prop_assert!((firm.inventory_level - (opening + committed - r.sales.units_sold).max(0.0)).abs() < 1e-6);
            prop_assert!(firm.assets.buildings >= 0.0 && firm.assets.machines >= 0.0 && firm.assets.equipment >= 0.0);
            prop_assert!(r.revenue.is_finite() && r.profit.is_finite());
            prop_assert!(firm.roi.is_finite());
        }
    }
}
