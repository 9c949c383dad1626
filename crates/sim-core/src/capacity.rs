//! Capacity model: how many units machines and staff can turn out per quarter.

use crate::model::{MachineClass, Qualification, Workforce};
use crate::params::{ABSOLUTE_MAX_CAPACITY, LOT_SIZE};

/// Headcount-weighted productivity of the workforce; `0.0` without staff.
pub fn weighted_productivity(workforce: &Workforce) -> f64 {
    let total = workforce.total();
    if total == 0 {
        return 0.0;
    }
    let weighted: f64 = Qualification::ALL
        .iter()
        .map(|&q| workforce.count(q) as f64 * q.productivity())
        .sum();
    weighted / total as f64
}

/// Maximum producible units for a machine class and workforce.
///
/// `lot_capacity × weighted_productivity × efficiency × LOT_SIZE`, never above
/// the absolute plant limit.
pub fn max_capacity(class: MachineClass, workforce: &Workforce) -> f64 {
    let units =
        class.lot_capacity() * weighted_productivity(workforce) * class.efficiency_factor() * LOT_SIZE;
    units.clamp(0.0, ABSOLUTE_MAX_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_staff_means_no_capacity() {
        let w = Workforce::default();
        assert_eq!(weighted_productivity(&w), 0.0);
        assert_eq!(max_capacity(MachineClass::Premium, &w), 0.0);
    }

    #[test]
    fn default_plant_covers_start_capacity() {
        let w = Workforce::new(20, 50, 30);
        let cap = max_capacity(MachineClass::Basic, &w);
        assert!((cap - 41_200.0).abs() < 1e-6);
        assert!(cap >= crate::params::START_CAPACITY);
    }

    #[test]
    fn better_machines_raise_ceiling() {
        let w = Workforce::new(20, 50, 30);
        let basic = max_capacity(MachineClass::Basic, &w);
        let pro = max_capacity(MachineClass::Professional, &w);
        let premium = max_capacity(MachineClass::Premium, &w);
        assert!(basic < pro && pro < premium);
    }

    proptest! {
        #[test]
        fn capacity_is_bounded_and_idempotent(u in 0u32..5_000, s in 0u32..5_000, k in 0u32..5_000) {
            let w = Workforce::new(u, s, k);
            for class in [MachineClass::Basic, MachineClass::Professional, MachineClass::Premium] {
                let a = max_capacity(class, &w);
                prop_assert!(a >= 0.0 && a <= ABSOLUTE_MAX_CAPACITY);
                prop_assert_eq!(a, max_capacity(class, &w));
            }
        }
    }
}
