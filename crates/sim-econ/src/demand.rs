//! Quarterly demand and realised sales for one firm.

use sim_core::model::SalesDetail;
use sim_core::params::*;
use sim_core::Firm;

/// `(reference_price / price)^1.5`; zero for a non-positive or non-finite price.
pub fn price_factor(price: f64) -> f64 {
    if !(price.is_finite() && price > 0.0) {
        return 0.0;
    }
    (REFERENCE_PRICE / price).powf(PRICE_ELASTICITY_EXPONENT)
}

/// Logarithmic marketing lift, capped.
pub fn marketing_factor(budget: f64) -> f64 {
    let budget = if budget.is_finite() { budget.max(0.0) } else { 0.0 };
    1.0 + ((1.0 + budget / MARKETING_SCALE).ln() * MARKETING_COEFFICIENT).min(MARKETING_CAP)
}

/// Price premium customers pay for quality.
pub fn quality_premium(quality: u8) -> f64 {
    1.0 + (quality as f64 / 10.0) * QUALITY_MAX_PREMIUM
}

/// Share of sales lost to stockouts. Zero at or above the low-stock threshold,
/// rising linearly to the maximum at zero safety stock.
pub fn stockout_penalty(safety_stock: f64) -> f64 {
    if !safety_stock.is_finite() || safety_stock >= LOW_STOCK_THRESHOLD {
        return 0.0;
    }
    let shortfall = (LOW_STOCK_THRESHOLD - safety_stock.max(0.0)) / LOW_STOCK_THRESHOLD;
    MAX_STOCKOUT_PENALTY * shortfall
}

/// Demand and sales for the firm's committed capacity, price and marketing.
pub fn compute_sales(firm: &Firm) -> SalesDetail {
    let capacity = firm.production_capacity.max(0.0);
    let price_factor = price_factor(firm.product_price);
    let marketing_factor = marketing_factor(firm.marketing_budget);
    let quality_premium = quality_premium(firm.quality_level);
    let penalty = stockout_penalty(firm.safety_stock);

    let effective_demand = capacity * price_factor * marketing_factor;
    let available = firm.inventory_level.max(0.0) + capacity;
    let units_sold = effective_demand.min(available) * (1.0 - penalty);

    SalesDetail {
        units_sold,
        effective_demand,
        effective_price: firm.product_price * quality_premium,
        quality_premium,
        price_factor,
        marketing_factor,
        stockout_penalty: penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::model::FirmId;

    #[test]
    fn reference_price_is_neutral() {
        assert!((price_factor(100.0) - 1.0).abs() < 1e-12);
        assert!(price_factor(120.0) < 1.0);
        assert!(price_factor(80.0) > 1.0);
        assert_eq!(price_factor(0.0), 0.0);
        assert_eq!(price_factor(f64::NAN), 0.0);
    }

    #[test]
    fn marketing_lift_is_capped() {
        assert_eq!(marketing_factor(0.0), 1.0);
        assert!(marketing_factor(30_000.0) > 1.0);
        assert!((marketing_factor(1.0e30) - (1.0 + MARKETING_CAP)).abs() < 1e-12);
        assert_eq!(marketing_factor(-5.0), 1.0);
    }

    #[test]
    fn stockout_penalty_is_linear_below_threshold() {
        assert_eq!(stockout_penalty(0.2), 0.0);
        assert_eq!(stockout_penalty(LOW_STOCK_THRESHOLD), 0.0);
        assert!((stockout_penalty(0.0) - MAX_STOCKOUT_PENALTY).abs() < 1e-12);
        assert!((stockout_penalty(0.05) - MAX_STOCKOUT_PENALTY / 2.0).abs() < 1e-12);
    }

    #[test]
    fn sales_never_exceed_stock_plus_output() {
        let mut firm = Firm::new(FirmId(1), "Cheap", "alice");
        firm.product_price = 50.0;
        firm.inventory_level = 0.0;
        let sales = compute_sales(&firm);
        assert!(sales.effective_demand > firm.production_capacity);
        assert!(sales.units_sold <= firm.production_capacity + 1e-9);
    }

    #[test]
    fn default_firm_sells_about_thirty_thousand() {
        let firm = Firm::new(FirmId(1), "Acme", "alice");
        let sales = compute_sales(&firm);
        assert!(sales.units_sold > 30_000.0 && sales.units_sold < 31_000.0);
        assert!((sales.effective_price - 127.5).abs() < 1e-9);
    }
}
