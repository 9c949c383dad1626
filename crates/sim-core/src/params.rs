//! Engine parameters.
//!
//! Every economic constant of the simulation lives here, grouped by the part of
//! the engine that reads it. Amounts are in euros per quarter unless noted.

// --- Starting position of a freshly founded firm ---
pub const START_CASH: f64 = 5_000_000.0;
pub const START_EQUITY: f64 = 5_000_000.0;
pub const START_PRICE: f64 = 120.0;
pub const START_CAPACITY: f64 = 40_000.0;
pub const START_INVENTORY: f64 = 10_000.0;
pub const START_SAFETY_STOCK: f64 = 0.20;
pub const START_MARKETING: f64 = 30_000.0;
pub const START_QUALITY: u8 = 5;
pub const START_BUILDINGS: f64 = 5_000_000.0;
pub const START_MACHINES: f64 = 8_000_000.0;
pub const START_EQUIPMENT: f64 = 3_000_000.0;
pub const START_BRAND_VALUE: f64 = 1_000_000.0;
pub const START_UNSKILLED: u32 = 20;
pub const START_SEMI_SKILLED: u32 = 50;
pub const START_SKILLED: u32 = 30;

// --- Demand ---
pub const REFERENCE_PRICE: f64 = 100.0;
pub const PRICE_ELASTICITY_EXPONENT: f64 = 1.5;
pub const MARKETING_SCALE: f64 = 1_000_000.0;
pub const MARKETING_COEFFICIENT: f64 = 0.05;
pub const MARKETING_CAP: f64 = 0.5;
pub const QUALITY_MAX_PREMIUM: f64 = 0.125;
/// Safety stock below this fraction triggers the stockout penalty.
pub const LOW_STOCK_THRESHOLD: f64 = 0.10;
/// Share of sales lost at zero safety stock.
pub const MAX_STOCKOUT_PENALTY: f64 = 0.15;

// --- Unit costs ---
pub const MATERIAL_COST_PER_UNIT: f64 = 30.0;
pub const PRODUCTION_COST_PER_UNIT: f64 = 20.0;
pub const ENERGY_COST_PER_UNIT: f64 = 2.0;
pub const INVENTORY_HOLDING_RATE: f64 = 0.02;
pub const OVERHEAD_COSTS: f64 = 200_000.0;
/// Share of quarterly revenue still outstanding at quarter end.
pub const RECEIVABLES_RATE: f64 = 0.25;

// --- Financing ---
/// Interest on debt not backed by an explicit loan (10% p.a.).
pub const LEGACY_QUARTERLY_INTEREST: f64 = 0.025;
pub const BASE_ANNUAL_LOAN_RATE: f64 = 0.10;
pub const DEFAULT_LOAN_QUARTERS: u32 = 12;
pub const MAX_LOAN_QUARTERS: u32 = 40;
pub const LOAN_CAPACITY_ASSET_SHARE: f64 = 0.5;
pub const MIN_CREDIT_RATING: f64 = 0.5;
pub const MAX_CREDIT_RATING: f64 = 1.5;
pub const TAX_RATE: f64 = 0.3333;

// --- Depreciation (per quarter) ---
pub const DEFAULT_BUILDINGS_DEPRECIATION: f64 = 0.005;
pub const DEFAULT_MACHINES_DEPRECIATION: f64 = 0.01;
pub const DEFAULT_EQUIPMENT_DEPRECIATION: f64 = 0.01;
pub const MIN_DEPRECIATION_RATE: f64 = 0.001;
pub const MAX_DEPRECIATION_RATE: f64 = 0.05;

// --- Decision limits ---
pub const MIN_PRICE: f64 = 50.0;
pub const MAX_PRICE: f64 = 500.0;
pub const MAX_MARKETING_CASH_SHARE: f64 = 0.30;
pub const MAX_RD_CASH_SHARE: f64 = 0.20;
pub const MAX_EFFICIENCY_CASH_SHARE: f64 = 0.10;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 10;

// --- Capacity model ---
/// Units per production lot.
pub const LOT_SIZE: f64 = 100.0;
pub const ABSOLUTE_MAX_CAPACITY: f64 = 120_000.0;

// --- Efficiency programmes ---
pub const EFFICIENCY_THRESHOLD: f64 = 1_000_000.0;
pub const EFFICIENCY_STEP: f64 = 0.95;
pub const MIN_PROCESS_FACTOR: f64 = 0.70;
pub const MIN_SUPPLIER_FACTOR: f64 = 0.70;
pub const MIN_OVERHEAD_FACTOR: f64 = 0.60;

// --- Research and innovation ---
/// Cumulative R&D spend that buys one quality level. At the 20% cash cap a
/// start-up firm needs several quarters per level.
pub const RD_COST_PER_QUALITY_LEVEL: f64 = 12_000_000.0;
pub const INNOVATION_THRESHOLD: f64 = 5_000_000.0;
pub const GROWTH_STAGE_FROM: u32 = 5;
pub const MATURITY_STAGE_FROM: u32 = 13;
pub const DECLINE_STAGE_FROM: u32 = 25;

// --- Valuation and M&A ---
pub const EBIT_MULTIPLE: f64 = 6.0;
pub const MIN_ENTERPRISE_VALUE: f64 = 500_000.0;
pub const ACQUISITION_PREMIUM: f64 = 1.30;
/// Share of a partial-acquisition price that reaches the target.
pub const PARTIAL_DEAL_TARGET_SHARE: f64 = 0.70;
pub const FULL_ACQUISITION_PCT: f64 = 99.9;
pub const BUYBACK_PREMIUM: f64 = 1.20;
pub const MAX_PUBLIC_FLOAT_PCT: f64 = 49.0;
pub const PUBLIC_SHAREHOLDER: &str = "Public";

// --- Antitrust (market share fractions) ---
pub const SESSION_MERGER_BLOCK: f64 = 0.50;
pub const SESSION_MERGER_WARN: f64 = 0.40;
pub const SHARE_DEAL_BLOCK: f64 = 0.40;
pub const SHARE_DEAL_REVIEW: f64 = 0.25;
pub const ANTITRUST_APPROACHING: f64 = 0.20;
pub const ANTITRUST_WARNING: f64 = 0.25;
pub const ANTITRUST_PENALTY: f64 = 0.30;
pub const ANTITRUST_CRITICAL: f64 = 0.40;
pub const PENALTY_FINE_RATE: f64 = 0.05;
pub const PENALTY_PRICE_CUT: f64 = 0.05;
pub const CRITICAL_FINE_RATE: f64 = 0.10;
pub const CRITICAL_DIVESTITURE: f64 = 0.25;

// --- Bankruptcy ---
pub const LIQUIDATION_DISCOUNT: f64 = 0.50;
pub const ADMINISTRATIVE_COST_RATE: f64 = 0.10;

// --- History ---
pub const HISTORY_CAP: usize = 20;

// --- Bots ---
pub const BOT_MARKER: &str = "Bot";
