use sim_core::params::*;
use sim_core::Firm;

/// Enterprise value used for acquisition and share pricing.
///
/// Book equity plus fixed assets and brand goodwill, less debt, plus an EBIT
/// multiple when the last quarter was profitable. Never below the floor.
pub fn enterprise_value(firm: &Firm) -> f64 {
    let earnings = if firm.ebit > 0.0 { firm.ebit * EBIT_MULTIPLE } else { 0.0 };
    let value = firm.equity + firm.assets.total() + firm.brand_value - firm.debt + earnings;
    if value.is_finite() {
        value.max(MIN_ENTERPRISE_VALUE)
    } else {
        MIN_ENTERPRISE_VALUE
    }
}

/// Price for `pct` percent of the firm including the control premium.
pub fn acquisition_price(firm: &Firm, pct: f64) -> f64 {
    enterprise_value(firm) * ACQUISITION_PREMIUM * (pct / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::model::FirmId;

    #[test]
    fn fresh_firm_value() {
        let firm = Firm::new(FirmId(1), "Acme", "alice");
        // 5M equity + 16M assets + 1M brand
        assert!((enterprise_value(&firm) - 22_000_000.0).abs() < 1e-6);
        assert!((acquisition_price(&firm, 100.0) - 28_600_000.0).abs() < 1e-6);
    }

    #[test]
    fn profitable_firms_earn_a_multiple() {
        let mut firm = Firm::new(FirmId(1), "Acme", "alice");
        let base = enterprise_value(&firm);
        firm.ebit = 100_000.0;
        assert!((enterprise_value(&firm) - base - 600_000.0).abs() < 1e-6);
        firm.ebit = -1_000_000.0;
        assert_eq!(enterprise_value(&firm), base);
    }

    #[test]
    fn value_is_floored() {
        let mut firm = Firm::new(FirmId(1), "Acme", "alice");
        firm.debt = 1.0e9;
        assert_eq!(enterprise_value(&firm), MIN_ENTERPRISE_VALUE);
        assert!(acquisition_price(&firm, 10.0) > 0.0);
    }
}
