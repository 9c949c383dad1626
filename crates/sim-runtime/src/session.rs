//! The game session: sole owner of every live firm.
//!
//! All mutating entry points take `&mut self`, so a session behind a single
//! writer lock (see [`crate::SharedSession`]) never interleaves a quarter
//! advance with a decision submission or an acquisition.

use crate::error::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sim_ai::{bot_profile, BotConfig};
use sim_core::model::{BankruptcyReport, FirmId, Loan, MachineClass};
use sim_core::params::{MAX_QUALITY, MIN_QUALITY};
use sim_core::{Firm, FirmListing, MarketEntry, SimConfig, ValidationError};
use sim_econ::mna::{self, DealKind};
use sim_econ::{
    acquisition_price, apply_decisions, check_merger, financing, operations, AcquisitionError,
    AcquisitionOutcome, AntitrustVerdict, DecisionBundle, MergerCheck,
};
use std::collections::BTreeMap;
use tracing::info;

/// Firms created by `populate_demo_firms`.
const DEMO_FIRMS: [(&str, &str); 3] = [
    ("TechCorp", "alice"),
    ("InnovateGmbH", "bob"),
    ("MarketLeader AG", "charlie"),
];

/// One row of the market overview, ranked by market share.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: MarketEntry,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    pub(crate) config: SimConfig,
    pub(crate) bot_config: BotConfig,
    pub(crate) firms: BTreeMap<FirmId, Firm>,
    pub(crate) bankruptcies: Vec<BankruptcyReport>,
    pub(crate) quarter: u32,
    pub(crate) quarter_start: DateTime<Utc>,
    pub(crate) rng: ChaCha8Rng,
    next_id: u32,
    bot_ordinal: u32,
    is_active: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::build(SimConfig::default(), BotConfig::default())
    }
}

impl GameSession {
    pub fn new(config: SimConfig) -> SessionResult<Self> {
        Self::with_bot_config(config, BotConfig::default())
    }

    pub fn with_bot_config(config: SimConfig, bot_config: BotConfig) -> SessionResult<Self> {
        config.validate()?;
        bot_config.validate()?;
        Ok(Self::build(config, bot_config))
    }

    fn build(config: SimConfig, bot_config: BotConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self {
            config,
            bot_config,
            firms: BTreeMap::new(),
            bankruptcies: Vec::new(),
            quarter: 0,
            quarter_start: Utc::now(),
            rng,
            next_id: 1,
            bot_ordinal: 0,
            is_active: false,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Quarters completed so far.
    pub fn quarter(&self) -> u32 {
        self.quarter
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn firms(&self) -> impl Iterator<Item = &Firm> {
        self.firms.values()
    }

    pub fn firm_count(&self) -> usize {
        self.firms.len()
    }

    /// Every liquidation since the session started, oldest first.
    pub fn bankruptcies(&self) -> &[BankruptcyReport] {
        &self.bankruptcies
    }

    // --- firms and users ---

    /// Founds a firm for a user who does not belong to any firm yet.
    pub fn create_firm(&mut self, name: &str, user: &str) -> SessionResult<&Firm> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.get_firm_by_user(user).is_some() {
            return Err(SessionError::UserTaken(user.to_string()));
        }
        if self.name_taken(name) {
            return Err(SessionError::NameTaken(name.to_string()));
        }
        let id = self.allocate_id();
        let mut firm = Firm::new(id, name, user);
        firm.current_quarter = self.quarter;
        info!(firm = %id, name, user, "firm created");
        Ok(self.firms.entry(id).or_insert(firm))
    }

    /// Adds a bot firm with a generated name and opening budget.
    pub(crate) fn create_bot(&mut self) -> FirmId {
        let profile = loop {
            self.bot_ordinal += 1;
            let profile = bot_profile(&mut self.rng, self.bot_ordinal);
            if !self.name_taken(&profile.name) {
                break profile;
            }
        };
        let id = self.allocate_id();
        let mut firm = Firm::new(id, profile.name, profile.user);
        firm.marketing_budget = profile.marketing;
        firm.quality_level = profile.quality.clamp(MIN_QUALITY as i32, MAX_QUALITY as i32) as u8;
        firm.current_quarter = self.quarter;
        self.firms.insert(id, firm);
        id
    }

    fn name_taken(&self, name: &str) -> bool {
        self.firms.values().any(|f| f.name == name)
    }

    fn allocate_id(&mut self) -> FirmId {
        let id = FirmId(self.next_id);
        self.next_id += 1;
        id
    }

    /// False when the firm does not exist or already has this user.
    pub fn add_user_to_firm(&mut self, id: FirmId, user: &str) -> bool {
        match self.firms.get_mut(&id) {
            Some(firm) => firm.add_user(user),
            None => false,
        }
    }

    pub fn get_firm_by_id(&self, id: FirmId) -> Option<&Firm> {
        self.firms.get(&id)
    }

    pub fn get_firm_by_user(&self, user: &str) -> Option<&Firm> {
        self.firms.values().find(|f| f.has_user(user))
    }

    fn live_firm_mut(&mut self, id: FirmId) -> SessionResult<&mut Firm> {
        let firm = self.firms.get_mut(&id).ok_or(SessionError::FirmNotFound(id))?;
        if firm.is_bankrupt {
            return Err(SessionError::FirmBankrupt(id));
        }
        Ok(firm)
    }

    /// Live firms by market share, largest first; ties keep id order.
    pub fn get_market_overview(&self) -> Vec<RankedEntry> {
        let mut entries: Vec<MarketEntry> = self.firms.values().map(Firm::market_entry).collect();
        entries.sort_by(|a, b| b.market_share.total_cmp(&a.market_share));
        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| RankedEntry { rank: i + 1, entry })
            .collect()
    }

    /// Compact listing in id order.
    pub fn list_firms(&self) -> Vec<FirmListing> {
        self.firms.values().map(Firm::listing).collect()
    }

    // --- decisions and firm operations ---

    /// Validates and stores decisions for the next quarter.
    pub fn submit_decision(&mut self, id: FirmId, bundle: &DecisionBundle) -> SessionResult<()> {
        let firm = self.live_firm_mut(id)?;
        apply_decisions(firm, bundle);
        Ok(())
    }

    pub fn take_loan(&mut self, id: FirmId, amount: f64, quarters: Option<u32>) -> SessionResult<Loan> {
        Ok(financing::take_loan(self.live_firm_mut(id)?, amount, quarters)?)
    }

    pub fn upgrade_machines(&mut self, id: FirmId, target: MachineClass) -> SessionResult<f64> {
        Ok(operations::upgrade_machines(self.live_firm_mut(id)?, target)?)
    }

    pub fn hire_personnel(&mut self, id: FirmId, qualification: &str, count: u32) -> SessionResult<f64> {
        Ok(operations::hire_by_key(self.live_firm_mut(id)?, qualification, count)?)
    }

    pub fn fire_personnel(&mut self, id: FirmId, qualification: &str, count: u32) -> SessionResult<f64> {
        Ok(operations::fire_by_key(self.live_firm_mut(id)?, qualification, count)?)
    }

    /// Returns the percentage of the firm sold to the public.
    pub fn issue_shares(&mut self, id: FirmId, amount: f64) -> SessionResult<f64> {
        Ok(financing::issue_shares(self.live_firm_mut(id)?, amount)?)
    }

    /// Returns the buyback cost.
    pub fn go_private(&mut self, id: FirmId) -> SessionResult<f64> {
        Ok(financing::buyback_shares_to_go_private(self.live_firm_mut(id)?)?)
    }

    /// Returns the innovation levels gained.
    pub fn invest_in_innovation(&mut self, id: FirmId, amount: f64) -> SessionResult<u32> {
        Ok(operations::invest_in_innovation(self.live_firm_mut(id)?, amount)?)
    }

    // --- mergers and acquisitions ---

    pub fn calculate_acquisition_cost(&self, target: FirmId, pct: f64) -> SessionResult<f64> {
        let target = self.firms.get(&target).ok_or(SessionError::FirmNotFound(target))?;
        if !(pct.is_finite() && (1.0..=100.0).contains(&pct)) {
            return Err(AcquisitionError::InvalidPercentage(pct).into());
        }
        Ok(acquisition_price(target, pct))
    }

    fn verdict(&self, check: MergerCheck, acquirer: FirmId, target: FirmId, pct: f64) -> SessionResult<AntitrustVerdict> {
        let a = self.firms.get(&acquirer).ok_or(SessionError::FirmNotFound(acquirer))?;
        let t = self.firms.get(&target).ok_or(SessionError::FirmNotFound(target))?;
        Ok(check_merger(check, a.market_share, t.market_share, pct))
    }

    /// The merger check acquisitions in this session must pass.
    pub fn check_antitrust(&self, acquirer: FirmId, target: FirmId, pct: f64) -> SessionResult<AntitrustVerdict> {
        self.verdict(MergerCheck::Session, acquirer, target, pct)
    }

    /// The stricter check applied to plain share purchases.
    pub fn check_share_deal(&self, acquirer: FirmId, target: FirmId, pct: f64) -> SessionResult<AntitrustVerdict> {
        self.verdict(MergerCheck::ShareDeal, acquirer, target, pct)
    }

    /// Buys `pct` percent of `target`. A full takeover removes the target
    /// from the session.
    pub fn acquire_firm(&mut self, acquirer: FirmId, target: FirmId, pct: f64) -> SessionResult<AcquisitionOutcome> {
        if acquirer == target {
            return Err(AcquisitionError::SelfAcquisition.into());
        }
        if !self.firms.contains_key(&acquirer) {
            return Err(SessionError::FirmNotFound(acquirer));
        }
        let mut target_firm = self.firms.remove(&target).ok_or(SessionError::FirmNotFound(target))?;
        let result = match self.firms.get_mut(&acquirer) {
            Some(buyer) => mna::acquire(buyer, &mut target_firm, pct, MergerCheck::Session),
            None => Err(AcquisitionError::AcquirerBankrupt),
        };
        match result {
            Ok(outcome) if outcome.kind == DealKind::Full => {
                self.forget_holdings(&[target]);
                Ok(outcome)
            }
            Ok(outcome) => {
                self.firms.insert(target, target_firm);
                Ok(outcome)
            }
            Err(e) => {
                self.firms.insert(target, target_firm);
                Err(e.into())
            }
        }
    }

    /// Drops portfolio entries that point at firms no longer in the session.
    pub(crate) fn forget_holdings(&mut self, gone: &[FirmId]) {
        for firm in self.firms.values_mut() {
            for id in gone {
                firm.portfolio.remove(id);
            }
        }
    }

    // --- population ---

    /// Adds `count` bots, or a random number from the configured range.
    pub fn populate_bots(&mut self, count: Option<u32>) -> Vec<FirmId> {
        let count = count.unwrap_or_else(|| {
            self.rng
                .gen_range(self.config.initial_bots_min..=self.config.initial_bots_max)
        });
        let ids: Vec<FirmId> = (0..count).map(|_| self.create_bot()).collect();
        info!(count, total = self.firms.len(), "bots created");
        ids
    }

    /// Adds the fixed demo firms whose users are not registered yet.
    pub fn populate_demo_firms(&mut self) -> Vec<FirmId> {
        let mut ids = Vec::new();
        for (name, user) in DEMO_FIRMS {
            if let Ok(firm) = self.create_firm(name, user) {
                ids.push(firm.id);
            }
        }
        ids
    }

    // --- session lifecycle ---

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.is_active = true;
        self.quarter_start = now;
        info!(quarter = self.quarter, "session started");
    }

    pub fn stop(&mut self) {
        self.is_active = false;
    }

    /// Back to an empty, inactive session with the RNG reseeded.
    pub fn reset(&mut self) {
        *self = Self::build(self.config.clone(), self.bot_config.clone());
        info!("session reset");
    }

    /// Whole seconds left in the running quarter.
    pub fn time_until_next_quarter(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.quarter_start).num_seconds().max(0) as u64;
        self.config.quarter_duration_secs.saturating_sub(elapsed)
    }

    /// Advisory: the caller decides whether to advance.
    pub fn should_advance_quarter(&self, now: DateTime<Utc>) -> bool {
        (now - self.quarter_start).num_seconds() >= self.config.quarter_duration_secs as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sim_core::params::*;

    fn session() -> GameSession {
        GameSession::new(SimConfig::default()).unwrap()
    }

    #[test]
    fn bot_config_with_bad_odds_is_rejected() {
        let bots = BotConfig {
            issue_probability: 1.5,
            issue_min_quarter: 0,
            issue_cash_trigger: f64::MAX,
            ..BotConfig::default()
        };
        assert!(matches!(
            GameSession::with_bot_config(SimConfig::default(), bots),
            Err(SessionError::Invalid(ValidationError::OutOfRange { field: "issue_probability", .. }))
        ));
    }

    #[test]
    fn firm_names_are_unique() {
        let mut s = session();
        s.create_firm("Acme", "alice").unwrap();
        assert_eq!(
            s.create_firm(" Acme ", "bob").unwrap_err(),
            SessionError::NameTaken("Acme".into())
        );
        assert!(s.get_firm_by_user("bob").is_none());
        assert_eq!(s.firm_count(), 1);
    }

    #[test]
    fn bots_skip_names_already_in_use() {
        let mut s = session();
        let mut preview = s.clone();
        let id = preview.create_bot();
        let taken = preview.firms[&id].name.clone();
        s.create_firm(&taken, "squatter").unwrap();
        let bot = s.create_bot();
        assert_ne!(s.firms[&bot].name, taken);
        assert_eq!(s.firms.values().filter(|f| f.name == taken).count(), 1);
    }

    #[test]
    fn ids_are_sequential_and_users_unique() {
        let mut s = session();
        let a = s.create_firm("Acme", "alice").unwrap().id;
        let b = s.create_firm("Beta", "bob").unwrap().id;
        assert_eq!((a, b), (FirmId(1), FirmId(2)));
        assert_eq!(
            s.create_firm("Other", "alice").unwrap_err(),
            SessionError::UserTaken("alice".into())
        );
        assert!(matches!(
            s.create_firm("   ", "dora"),
            Err(SessionError::Invalid(ValidationError::EmptyName))
        ));
        assert_eq!(s.get_firm_by_user("bob").map(|f| f.id), Some(b));
    }

    #[test]
    fn users_join_existing_firms_once() {
        let mut s = session();
        let id = s.create_firm("Acme", "alice").unwrap().id;
        assert!(s.add_user_to_firm(id, "bob"));
        assert!(!s.add_user_to_firm(id, "bob"));
        assert!(!s.add_user_to_firm(FirmId(99), "carol"));
        assert_eq!(s.get_firm_by_user("bob").map(|f| f.id), Some(id));
    }

    #[test]
    fn submitted_decisions_are_clamped() {
        let mut s = session();
        let id = s.create_firm("Acme", "alice").unwrap().id;
        let bundle = DecisionBundle {
            price: 10_000.0,
            capacity: 1e9,
            marketing: 1e9,
            rd: -5.0,
            quality: 42,
            safety_stock_pct: 250.0,
            efficiency: None,
            depreciation: None,
        };
        s.submit_decision(id, &bundle).unwrap();
        let f = s.get_firm_by_id(id).unwrap();
        assert_eq!(f.product_price, MAX_PRICE);
        assert_eq!(f.production_capacity, f.max_capacity());
        assert!(f.marketing_budget <= START_CASH * MAX_MARKETING_CASH_SHARE + 1e-6);
        assert_eq!(f.rd_budget, 0.0);
        assert_eq!(f.quality_level, MAX_QUALITY);
        assert_eq!(f.safety_stock, 1.0);
        assert_eq!(
            s.submit_decision(FirmId(7), &bundle).unwrap_err(),
            SessionError::FirmNotFound(FirmId(7))
        );
    }

    #[test]
    fn overview_is_ranked_by_share() {
        let mut s = session();
        for (name, user, share) in [("A", "a", 0.2), ("B", "b", 0.5), ("C", "c", 0.3)] {
            let id = s.create_firm(name, user).unwrap().id;
            s.firms.get_mut(&id).unwrap().market_share = share;
        }
        let overview = s.get_market_overview();
        let names: Vec<_> = overview.iter().map(|r| r.entry.name.as_str()).collect();
        assert_eq!(names, ["B", "C", "A"]);
        assert_eq!(overview[0].rank, 1);
        assert_eq!(s.list_firms().len(), 3);
    }

    #[test]
    fn two_checks_disagree_on_forty_five_percent() {
        let mut s = session();
        let a = s.create_firm("A", "a").unwrap().id;
        let t = s.create_firm("T", "t").unwrap().id;
        s.firms.get_mut(&a).unwrap().market_share = 0.25;
        s.firms.get_mut(&t).unwrap().market_share = 0.20;
        assert!(s.check_antitrust(a, t, 100.0).unwrap().allowed);
        assert!(!s.check_share_deal(a, t, 100.0).unwrap().allowed);
    }

    #[test]
    fn full_takeover_removes_target() {
        let mut s = session();
        let a = s.create_firm("A", "a").unwrap().id;
        let t = s.create_firm("T", "t").unwrap().id;
        s.firms.get_mut(&a).unwrap().cash = 50_000_000.0;
        let price = s.calculate_acquisition_cost(t, 100.0).unwrap();
        let outcome = s.acquire_firm(a, t, 100.0).unwrap();
        assert_eq!(outcome.kind, DealKind::Full);
        assert!(price > 0.0);
        assert!((outcome.price - price).abs() < 1e-6);
        assert!(s.get_firm_by_id(t).is_none());
        assert!((s.get_firm_by_id(a).unwrap().cash - (50_000_000.0 - price)).abs() < 1e-6);
    }

    #[test]
    fn partial_stake_keeps_target_and_records_holding() {
        let mut s = session();
        let a = s.create_firm("A", "a").unwrap().id;
        let t = s.create_firm("T", "t").unwrap().id;
        s.firms.get_mut(&a).unwrap().cash = 20_000_000.0;
        s.acquire_firm(a, t, 30.0).unwrap();
        let target = s.get_firm_by_id(t).unwrap();
        assert!((target.shares["A"] - 30.0).abs() < 1e-9);
        assert!((s.get_firm_by_id(a).unwrap().portfolio[&t] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn stake_topped_up_to_the_whole_firm_removes_target() {
        let mut s = session();
        let a = s.create_firm("A", "a").unwrap().id;
        let t = s.create_firm("T", "t").unwrap().id;
        s.firms.get_mut(&a).unwrap().cash = 100_000_000.0;
        s.acquire_firm(a, t, 60.0).unwrap();
        let rest = s.calculate_acquisition_cost(t, 40.0).unwrap();
        let out = s.acquire_firm(a, t, 40.0).unwrap();
        assert_eq!(out.kind, DealKind::Full);
        assert!((out.price - rest).abs() < 1e-6);
        assert!(s.get_firm_by_id(t).is_none());
        assert!(s.get_firm_by_id(a).unwrap().portfolio.is_empty());
    }

    #[test]
    fn failed_acquisition_restores_target() {
        let mut s = session();
        let a = s.create_firm("A", "a").unwrap().id;
        let t = s.create_firm("T", "t").unwrap().id;
        let err = s.acquire_firm(a, t, 100.0).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Acquisition(AcquisitionError::InsufficientCash { .. })
        ));
        assert!(s.get_firm_by_id(t).is_some());
        assert!(matches!(
            s.acquire_firm(a, a, 50.0),
            Err(SessionError::Acquisition(AcquisitionError::SelfAcquisition))
        ));
        assert_eq!(
            s.acquire_firm(a, FirmId(9), 50.0).unwrap_err(),
            SessionError::FirmNotFound(FirmId(9))
        );
    }

    #[test]
    fn business_errors_surface_typed() {
        let mut s = session();
        let id = s.create_firm("Acme", "alice").unwrap().id;
        assert!(matches!(
            s.hire_personnel(id, "wizard", 3),
            Err(SessionError::Business(_))
        ));
        s.hire_personnel(id, "facharbeiter", 2).unwrap();
        assert_eq!(s.get_firm_by_id(id).unwrap().workforce.skilled, START_SKILLED + 2);
        let loan = s.take_loan(id, 1_000_000.0, Some(8)).unwrap();
        assert_eq!(loan.quarters_remaining, 8);
    }

    #[test]
    fn bots_get_unique_names() {
        let mut s = session();
        let ids = s.populate_bots(Some(12));
        assert_eq!(ids.len(), 12);
        let mut names: Vec<_> = s.firms().map(|f| f.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 12);
        assert!(s.firms().all(Firm::is_bot));
    }

    #[test]
    fn random_bot_count_stays_in_range() {
        let mut s = session();
        let n = s.populate_bots(None).len() as u32;
        assert!((s.config.initial_bots_min..=s.config.initial_bots_max).contains(&n));
    }

    #[test]
    fn demo_firms_are_added_once() {
        let mut s = session();
        assert_eq!(s.populate_demo_firms().len(), 3);
        assert!(s.populate_demo_firms().is_empty());
        assert_eq!(s.firm_count(), 3);
    }

    #[test]
    fn quarter_timer_is_advisory() {
        let mut s = session();
        let t0 = Utc::now();
        s.start(t0);
        assert!(s.is_active());
        assert_eq!(s.time_until_next_quarter(t0 + Duration::seconds(20)), 100);
        assert!(!s.should_advance_quarter(t0 + Duration::seconds(119)));
        assert!(s.should_advance_quarter(t0 + Duration::seconds(120)));
        assert_eq!(s.time_until_next_quarter(t0 + Duration::seconds(500)), 0);
    }

    #[test]
    fn reset_empties_the_session() {
        let mut s = session();
        s.populate_bots(Some(3));
        s.start(Utc::now());
        s.reset();
        assert_eq!(s.firm_count(), 0);
        assert!(!s.is_active());
        assert_eq!(s.create_firm("Acme", "alice").unwrap().id, FirmId(1));
    }
}
