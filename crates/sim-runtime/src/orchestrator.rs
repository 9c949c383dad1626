//! Quarter advance.
//!
//! Steps run in a fixed order:
//! 1. bots choose decisions
//! 2. the ledger closes the quarter for every live firm
//! 3. market shares from this quarter's revenue
//! 4. antitrust enforcement on those shares
//! 5. bankruptcy sweep
//! 6. new bot entrants
//!
//! Shares must be in place before enforcement and the sweep read them.

use crate::session::GameSession;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_ai::{MarketStats, Strategy};
use sim_core::model::{BankruptcyReport, FirmId, QuarterResults};
use sim_core::Firm;
use sim_econ::antitrust::enforce;
use sim_econ::bankruptcy::{is_insolvent, liquidate};
use sim_econ::{apply_decisions, calculate_quarterly_results, AntitrustTier, EnforcementAction};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Everything that happened in one quarter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterReport {
    /// The quarter just completed.
    pub quarter: u32,
    pub results: BTreeMap<FirmId, QuarterResults>,
    pub bot_strategies: BTreeMap<FirmId, Strategy>,
    pub enforcement: Vec<EnforcementAction>,
    pub bankruptcies: Vec<BankruptcyReport>,
    pub new_entrants: Vec<FirmId>,
}

/// Revenue share of every live firm: sums to one, or all zero when the
/// market had no revenue.
pub fn market_shares(firms: &BTreeMap<FirmId, Firm>) -> BTreeMap<FirmId, f64> {
    let live = || firms.values().filter(|f| !f.is_bankrupt);
    let total: f64 = live().map(|f| f.revenue.max(0.0)).sum();
    live()
        .map(|f| {
            let share = if total > 0.0 { f.revenue.max(0.0) / total } else { 0.0 };
            (f.id, share)
        })
        .collect()
}

impl GameSession {
    /// Runs one quarter tick and reports the outcome.
    pub fn advance_quarter(&mut self) -> QuarterReport {
        let mut report = QuarterReport::default();

        // 1. bots
        let stats = MarketStats::from_firms(self.firms.values());
        for firm in self.firms.values_mut().filter(|f| f.is_bot() && !f.is_bankrupt) {
            let decision = sim_ai::decide(firm, &stats, self.quarter, &self.bot_config, &mut self.rng);
            apply_decisions(firm, &decision.bundle);
            for action in &decision.secondary {
                if let Err(e) = sim_ai::execute(firm, action) {
                    debug!(firm = %firm.id, ?action, error = %e, "bot action skipped");
                }
            }
            report.bot_strategies.insert(firm.id, decision.strategy);
        }

        // 2. ledger
        let cap = self.config.history_cap;
        for firm in self.firms.values_mut().filter(|f| !f.is_bankrupt) {
            let results = calculate_quarterly_results(firm);
            firm.push_history(firm.history_entry(), cap);
            report.results.insert(firm.id, results);
        }
        self.quarter += 1;
        report.quarter = self.quarter;

        // 3. market shares
        for (id, share) in market_shares(&self.firms) {
            if let Some(firm) = self.firms.get_mut(&id) {
                firm.record_market_share(share);
            }
            if let Some(results) = report.results.get_mut(&id) {
                results.market_share = share;
            }
        }

        // 4. antitrust
        for firm in self.firms.values_mut() {
            if let Some(action) = enforce(firm) {
                if action.tier >= AntitrustTier::Penalty {
                    warn!(
                        firm = %action.firm_id,
                        tier = ?action.tier,
                        share = action.market_share,
                        fine = action.fine,
                        "antitrust sanction"
                    );
                } else {
                    debug!(firm = %action.firm_id, tier = ?action.tier, "antitrust notice");
                }
                report.enforcement.push(action);
            }
        }

        // 5. bankruptcies
        let insolvent: Vec<FirmId> = self
            .firms
            .values()
            .filter(|f| is_insolvent(f))
            .map(|f| f.id)
            .collect();
        for id in &insolvent {
            if let Some(mut firm) = self.firms.remove(id) {
                let bankruptcy = liquidate(&mut firm, self.quarter);
                self.bankruptcies.push(bankruptcy.clone());
                report.bankruptcies.push(bankruptcy);
            }
        }
        if !insolvent.is_empty() {
            self.forget_holdings(&insolvent);
            // Shares among the survivors. Restoring the previous share first
            // keeps the quarter-on-quarter growth figure intact.
            for (id, share) in market_shares(&self.firms) {
                if let Some(firm) = self.firms.get_mut(&id) {
                    firm.market_share = firm.prev_market_share;
                    firm.record_market_share(share);
                }
                if let Some(results) = report.results.get_mut(&id) {
                    results.market_share = share;
                }
            }
        }

        // 6. entrants
        let interval = self.config.entrant_interval;
        let ceiling = self.config.max_live_firms;
        if interval > 0 && self.quarter % interval == 0 && self.firms.len() < ceiling {
            let room = (ceiling - self.firms.len()) as u32;
            let count = self
                .rng
                .gen_range(self.config.entrants_min..=self.config.entrants_max)
                .min(room);
            report.new_entrants = (0..count).map(|_| self.create_bot()).collect();
            if count > 0 {
                info!(quarter = self.quarter, count, "new bot firms entered the market");
            }
        }

        self.quarter_start = Utc::now();
        info!(
            quarter = self.quarter,
            firms = self.firms.len(),
            bankruptcies = report.bankruptcies.len(),
            "quarter completed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::params::*;
    use sim_core::SimConfig;
    use sim_econ::DecisionBundle;

    fn quiet_config() -> SimConfig {
        SimConfig {
            entrant_interval: 0,
            ..SimConfig::default()
        }
    }

    fn bundle(price: f64) -> DecisionBundle {
        DecisionBundle {
            price,
            capacity: 40_000.0,
            marketing: 30_000.0,
            rd: 0.0,
            quality: 5,
            safety_stock_pct: 20.0,
            efficiency: None,
            depreciation: None,
        }
    }

    #[test]
    fn shares_sum_to_one() {
        let mut s = GameSession::new(quiet_config()).unwrap();
        for (i, price) in [100.0, 120.0, 150.0].into_iter().enumerate() {
            let id = s.create_firm(&format!("F{i}"), &format!("u{i}")).unwrap().id;
            s.submit_decision(id, &bundle(price)).unwrap();
        }
        let report = s.advance_quarter();
        assert_eq!(report.quarter, 1);
        let total: f64 = s.firms().map(|f| f.market_share).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let cheapest = s.get_firm_by_user("u0").unwrap();
        assert!(cheapest.market_share > s.get_firm_by_user("u2").unwrap().market_share);
        assert_eq!(cheapest.history.len(), 1);
        assert_eq!(cheapest.history[0].quarter, 1);
        assert!((cheapest.history[0].market_share - cheapest.market_share).abs() < 1e-12);
        assert!((report.results[&cheapest.id].market_share - cheapest.market_share).abs() < 1e-12);
    }

    #[test]
    fn no_revenue_means_zero_shares() {
        let mut s = GameSession::new(quiet_config()).unwrap();
        let id = s.create_firm("Idle", "idle").unwrap().id;
        {
            let f = s.firms.get_mut(&id).unwrap();
            f.production_capacity = 0.0;
            f.inventory_level = 0.0;
        }
        s.advance_quarter();
        assert_eq!(s.get_firm_by_id(id).unwrap().market_share, 0.0);
    }

    #[test]
    fn insolvent_firm_is_liquidated_once_and_removed() {
        let mut s = GameSession::new(quiet_config()).unwrap();
        let doomed = s.create_firm("Doomed", "d").unwrap().id;
        let healthy = s.create_firm("Healthy", "h").unwrap().id;
        s.firms.get_mut(&doomed).unwrap().cash = -5_000_000.0;
        s.firms.get_mut(&healthy).unwrap().portfolio.insert(doomed, 10.0);

        let report = s.advance_quarter();
        assert_eq!(report.bankruptcies.len(), 1);
        assert_eq!(report.bankruptcies[0].firm_id, doomed);
        assert!(s.get_firm_by_id(doomed).is_none());
        assert!(s.get_firm_by_id(healthy).unwrap().portfolio.is_empty());
        assert!((s.get_firm_by_id(healthy).unwrap().market_share - 1.0).abs() < 1e-12);

        let next = s.advance_quarter();
        assert!(next.bankruptcies.is_empty());
        assert_eq!(s.bankruptcies().len(), 1);
    }

    #[test]
    fn dominant_firm_is_sanctioned() {
        let mut s = GameSession::new(quiet_config()).unwrap();
        let big = s.create_firm("Big", "big").unwrap().id;
        let small = s.create_firm("Small", "small").unwrap().id;
        s.submit_decision(small, &DecisionBundle { capacity: 5_000.0, ..bundle(150.0) }).unwrap();
        s.firms.get_mut(&small).unwrap().inventory_level = 0.0;
        let report = s.advance_quarter();
        let action = report.enforcement.iter().find(|a| a.firm_id == big).unwrap();
        assert!(action.tier >= AntitrustTier::Penalty);
        assert!(action.fine > 0.0);
    }

    #[test]
    fn entrants_arrive_on_schedule() {
        let config = SimConfig {
            entrant_interval: 2,
            entrants_min: 2,
            entrants_max: 2,
            ..SimConfig::default()
        };
        let mut s = GameSession::new(config).unwrap();
        s.create_firm("Acme", "alice").unwrap();
        assert!(s.advance_quarter().new_entrants.is_empty());
        let report = s.advance_quarter();
        assert_eq!(report.new_entrants.len(), 2);
        assert_eq!(s.firm_count(), 3);
        for id in &report.new_entrants {
            let f = s.get_firm_by_id(*id).unwrap();
            assert!(f.is_bot());
            assert_eq!(f.current_quarter, 2);
        }
    }

    #[test]
    fn entrants_respect_the_live_firm_ceiling() {
        let config = SimConfig {
            entrant_interval: 1,
            entrants_min: 3,
            entrants_max: 3,
            max_live_firms: 4,
            ..SimConfig::default()
        };
        let mut s = GameSession::new(config).unwrap();
        s.populate_bots(Some(3));
        assert_eq!(s.advance_quarter().new_entrants.len(), 1);
        assert!(s.advance_quarter().new_entrants.is_empty());
    }

    #[test]
    fn bots_play_and_history_is_capped() {
        let config = SimConfig {
            history_cap: 4,
            ..quiet_config()
        };
        let mut s = GameSession::new(config).unwrap();
        s.populate_bots(Some(6));
        let mut last = QuarterReport::default();
        for _ in 0..6 {
            last = s.advance_quarter();
        }
        assert!(!last.bot_strategies.is_empty());
        for f in s.firms() {
            assert!(f.history.len() <= 4);
            assert!(f.product_price >= MIN_PRICE && f.product_price <= MAX_PRICE);
        }
    }

    #[test]
    fn report_serializes_with_firm_id_keys() {
        let mut s = GameSession::new(quiet_config()).unwrap();
        s.create_firm("Acme", "alice").unwrap();
        let json = serde_json::to_value(s.advance_quarter()).unwrap();
        assert_eq!(json["quarter"], 1);
        assert!(json["results"]["1"]["revenue"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn same_seed_same_game() {
        let run = || {
            let mut s = GameSession::new(SimConfig::default()).unwrap();
            s.populate_bots(Some(8));
            for _ in 0..6 {
                s.advance_quarter();
            }
            s.firms()
                .map(|f| (f.name.clone(), f.cash, f.market_share))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn shares_normalise_for_any_prices(prices in proptest::collection::vec(MIN_PRICE..MAX_PRICE, 1..8)) {
            let mut s = GameSession::new(quiet_config()).unwrap();
            for (i, p) in prices.iter().enumerate() {
                let id = s.create_firm(&format!("F{i}"), &format!("u{i}")).unwrap().id;
                s.submit_decision(id, &bundle(*p)).unwrap();
            }
            s.advance_quarter();
            let total: f64 = s.firms().map(|f| f.market_share).sum();
            let any_revenue = s.firms().any(|f| f.revenue > 0.0);
            if any_revenue {
                prop_assert!((total - 1.0).abs() < 1e-9);
            } else {
                prop_assert_eq!(total, 0.0);
            }
        }
    }
}
