//! Decimal rounding for reported money and ratios.
//!
//! Engine arithmetic runs on `f64`; values leaving the engine are rounded
//! through `rust_decimal` so that snapshots carry stable, half-even rounded
//! figures.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds `value` to `dp` decimal places, half to even. Non-finite input
/// becomes `0.0`.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

pub fn round2(value: f64) -> f64 {
    round_dp(value, 2)
}

pub fn round_opt(value: Option<f64>, dp: u32) -> Option<f64> {
    value.map(|v| round_dp(v, dp))
}

/// Formats whole euros with thousands separators, e.g. `€1,250,000`.
pub fn format_eur(value: f64) -> String {
    let whole = Decimal::from_f64(round_dp(value, 0))
        .map(|d| d.trunc())
        .unwrap_or(Decimal::ZERO);
    let negative = whole.is_sign_negative() && !whole.is_zero();
    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-€{grouped}")
    } else {
        format!("€{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(round_dp(2.5, 0), 2.0);
        assert_eq!(round_dp(3.5, 0), 4.0);
        assert!((round2(1234.5678) - 1234.57).abs() < 1e-9);
    }

    #[test]
    fn non_finite_becomes_zero() {
        assert_eq!(round2(f64::NAN), 0.0);
        assert_eq!(round2(f64::INFINITY), 0.0);
        assert_eq!(round_opt(None, 2), None);
    }

    #[test]
    fn formats_euros() {
        assert_eq!(format_eur(1_250_000.4), "€1,250,000");
        assert_eq!(format_eur(999.0), "€999");
        assert_eq!(format_eur(-12_000.0), "-€12,000");
        assert_eq!(format_eur(0.0), "€0");
    }

    proptest! {
        #[test]
        fn rounding_stays_close(v in -1.0e12f64..1.0e12) {
            prop_assert!((round2(v) - v).abs() <= 0.005 + 1e-6);
        }
    }
}
