//! Insolvency: liquidation and the creditor waterfall.

use sim_core::model::{BankruptcyReport, CreditorClaim, FixedAssets};
use sim_core::params::{ADMINISTRATIVE_COST_RATE, LIQUIDATION_DISCOUNT};
use sim_core::Firm;
use tracing::warn;

/// Whether the firm must enter insolvency at this point.
pub fn is_insolvent(firm: &Firm) -> bool {
    !firm.is_bankrupt && firm.cash <= 0.0
}

/// One claim per outstanding loan plus one for debt not backed by a loan.
fn creditor_claims(firm: &Firm) -> Vec<CreditorClaim> {
    let mut claims: Vec<CreditorClaim> = firm
        .loans
        .iter()
        .enumerate()
        .filter(|(_, loan)| loan.principal > 0.0)
        .map(|(i, loan)| CreditorClaim {
            creditor: format!("loan {}", i + 1),
            claim: loan.principal,
            payout: 0.0,
        })
        .collect();
    let legacy = firm.legacy_debt();
    if legacy > 0.0 {
        claims.push(CreditorClaim {
            creditor: "legacy debt".to_string(),
            claim: legacy,
            payout: 0.0,
        });
    }
    claims
}

/// Liquidates the firm and pays claims in order: administration, priority
/// claims (one quarter of wages), then creditors pro rata; shareholders get
/// what is left.
///
/// Calling this on a firm already liquidated returns the stored report and
/// changes nothing.
pub fn liquidate(firm: &mut Firm, quarter: u32) -> BankruptcyReport {
    if let Some(report) = &firm.bankruptcy {
        return report.clone();
    }

    let asset_value = firm.assets.total().max(0.0) + firm.inventory_value().max(0.0);
    let liquidation_value = asset_value * LIQUIDATION_DISCOUNT + firm.cash.max(0.0);
    let administrative_costs = liquidation_value * ADMINISTRATIVE_COST_RATE;
    let mut remaining = liquidation_value - administrative_costs;

    let priority_claims = firm.workforce.quarterly_cost();
    let priority_claims_paid = priority_claims.min(remaining);
    remaining -= priority_claims_paid;

    let mut creditors = creditor_claims(firm);
    let creditor_claims: f64 = creditors.iter().map(|c| c.claim).sum();
    let creditor_payout = creditor_claims.min(remaining.max(0.0));
    remaining -= creditor_payout;
    let recovery_rate = if creditor_claims > 0.0 {
        creditor_payout / creditor_claims
    } else {
        1.0
    };
    for c in &mut creditors {
        c.payout = c.claim * recovery_rate;
    }

    let report = BankruptcyReport {
        firm_id: firm.id,
        firm_name: firm.name.clone(),
        quarter,
        cash_at_failure: firm.cash,
        liquidation_value,
        administrative_costs,
        priority_claims_paid,
        creditor_claims,
        creditor_payout,
        recovery_rate,
        creditors,
        shareholder_residual: remaining.max(0.0),
    };

    firm.is_bankrupt = true;
    firm.assets = FixedAssets::default();
    firm.inventory_level = 0.0;
    firm.production_capacity = 0.0;
    firm.loans.clear();
    firm.debt = 0.0;
    firm.bankruptcy = Some(report.clone());

    warn!(
        firm = %firm.id,
        name = %firm.name,
        quarter,
        recovery = recovery_rate,
        "firm bankrupt and liquidated"
    );
    report
}
