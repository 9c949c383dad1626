//! Loans, credit and equity transactions.

use crate::ratios;
use crate::valuation::enterprise_value;
use sim_core::model::Loan;
use sim_core::params::*;
use sim_core::{BusinessError, Firm};
use tracing::debug;

/// Recomputes liquidity, credit rating and the borrowing ceiling.
pub fn refresh_credit(firm: &mut Firm) {
    firm.liquidity = ratios::liquidity(firm);
    firm.credit_rating = ratios::credit_rating(firm);
    firm.max_loan_capacity = ratios::max_loan_capacity(firm);
}

/// Takes an annuity loan at the firm's quoted rate.
///
/// `quarters` defaults to twelve. The amount must fit the open credit line.
pub fn take_loan(firm: &mut Firm, amount: f64, quarters: Option<u32>) -> Result<Loan, BusinessError> {
    if firm.is_bankrupt {
        return Err(BusinessError::Bankrupt);
    }
    if !(amount.is_finite() && amount > 0.0) {
        return Err(BusinessError::InvalidAmount);
    }
    let quarters = quarters.unwrap_or(DEFAULT_LOAN_QUARTERS);
    if quarters == 0 || quarters > MAX_LOAN_QUARTERS {
        return Err(BusinessError::InvalidLoanTerm {
            got: quarters,
            max: MAX_LOAN_QUARTERS,
        });
    }
    let available = firm.available_credit();
    if amount > available {
        return Err(BusinessError::CreditLimitExceeded {
            requested: amount,
            available,
        });
    }
    let loan = Loan::annuity(amount, firm.quoted_loan_rate(), quarters);
    firm.cash += amount;
    firm.debt += amount;
    firm.loans.push(loan.clone());
    refresh_credit(firm);
    debug!(firm = %firm.id, amount, quarters, rate = loan.annual_rate, "loan taken");
    Ok(loan)
}

/// Services every loan for one quarter and returns the principal repaid.
///
/// Interest is expensed by the ledger; only principal leaves cash here. A
/// loan reaching its last quarter is settled in full and removed.
pub fn amortize_loans(firm: &mut Firm) -> f64 {
    let mut repaid = 0.0;
    for loan in firm.loans.iter_mut() {
        let interest = loan.interest_due();
        let mut principal_part = (loan.quarterly_payment - interest).clamp(0.0, loan.principal);
        loan.quarters_remaining = loan.quarters_remaining.saturating_sub(1);
        if loan.quarters_remaining == 0 {
            principal_part = loan.principal;
        }
        loan.principal -= principal_part;
        repaid += principal_part;
    }
    firm.loans.retain(|l| l.quarters_remaining > 0);
    firm.cash -= repaid;
    firm.debt = (firm.debt - repaid).max(0.0);
    repaid
}

/// Issues new shares to the public float for `amount` of cash.
///
/// Shares are priced at enterprise value; existing holders are diluted pro
/// rata. Returns the percentage issued.
pub fn issue_shares(firm: &mut Firm, amount: f64) -> Result<f64, BusinessError> {
    if firm.is_bankrupt {
        return Err(BusinessError::Bankrupt);
    }
    if !(amount.is_finite() && amount > 0.0) {
        return Err(BusinessError::InvalidAmount);
    }
    let pre_money = enterprise_value(firm);
    let issued_pct = amount / (pre_money + amount) * 100.0;
    let float = firm.shares.get(PUBLIC_SHAREHOLDER).copied().unwrap_or(0.0);
    let new_float = float * (1.0 - issued_pct / 100.0) + issued_pct;
    if new_float > MAX_PUBLIC_FLOAT_PCT {
        return Err(BusinessError::FloatLimitExceeded(new_float));
    }
    for held in firm.shares.values_mut() {
        *held *= 1.0 - issued_pct / 100.0;
    }
    *firm.shares.entry(PUBLIC_SHAREHOLDER.to_string()).or_insert(0.0) += issued_pct;
    firm.cash += amount;
    firm.equity += amount;
    firm.is_public = true;
    firm.enterprise_value = enterprise_value(firm);
    debug!(firm = %firm.id, amount, issued_pct, "shares issued");
    Ok(issued_pct)
}

/// Buys the public float back at a premium and takes the firm private.
///
/// The repurchased percentage is spread over the remaining holders. Returns
/// the price paid.
pub fn buyback_shares_to_go_private(firm: &mut Firm) -> Result<f64, BusinessError> {
    if firm.is_bankrupt {
        return Err(BusinessError::Bankrupt);
    }
    if !firm.is_public {
        return Err(BusinessError::NotPublic);
    }
    let float = firm.shares.get(PUBLIC_SHAREHOLDER).copied().unwrap_or(0.0);
    let cost = enterprise_value(firm) * float / 100.0 * BUYBACK_PREMIUM;
    if firm.cash < cost {
        return Err(BusinessError::InsufficientCash {
            needed: cost,
            available: firm.cash,
        });
    }
    firm.shares.remove(PUBLIC_SHAREHOLDER);
    let remaining: f64 = firm.shares.values().sum();
    if remaining > 0.0 {
        for held in firm.shares.values_mut() {
            *held += float * (*held / remaining);
        }
    } else if let Some(founder) = firm.user_names.first().cloned() {
        firm.shares.insert(founder, 100.0);
    }
    firm.cash -= cost;
    firm.equity -= cost;
    firm.is_public = false;
    firm.enterprise_value = enterprise_value(firm);
    debug!(firm = %firm.id, cost, "float repurchased");
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::model::FirmId;

    fn firm() -> Firm {
        let mut f = Firm::new(FirmId(1), "Acme", "alice");
        refresh_credit(&mut f);
        f
    }

    #[test]
    fn loan_adds_cash_and_debt() {
        let mut f = firm();
        let loan = take_loan(&mut f, 1_000_000.0, None).unwrap();
        assert_eq!(loan.quarters_remaining, DEFAULT_LOAN_QUARTERS);
        assert_eq!(f.cash, START_CASH + 1_000_000.0);
        assert_eq!(f.debt, 1_000_000.0);
        assert_eq!(f.loans.len(), 1);
        assert!(f.liquidity.liquidity_1.is_some());
    }

    #[test]
    fn loan_term_and_limit_are_checked() {
        let mut f = firm();
        assert_eq!(
            take_loan(&mut f, 1_000.0, Some(0)),
            Err(BusinessError::InvalidLoanTerm { got: 0, max: MAX_LOAN_QUARTERS })
        );
        assert!(matches!(take_loan(&mut f, 1.0e12, Some(4)), Err(BusinessError::CreditLimitExceeded { .. })));
        assert_eq!(take_loan(&mut f, -1.0, None), Err(BusinessError::InvalidAmount));
        assert!(f.loans.is_empty());
    }

    #[test]
    fn loans_amortize_to_zero() {
        let mut f = firm();
        take_loan(&mut f, 800_000.0, Some(4)).unwrap();
        let mut last = f.loans[0].quarters_remaining;
        let mut repaid = 0.0;
        for _ in 0..4 {
            repaid += amortize_loans(&mut f);
            if let Some(loan) = f.loans.first() {
                assert!(loan.quarters_remaining < last);
                last = loan.quarters_remaining;
            }
        }
        assert!(f.loans.is_empty());
        assert!((repaid - 800_000.0).abs() < 1e-6);
        assert!(f.debt.abs() < 1e-6);
    }

    #[test]
    fn issue_and_buy_back() {
        let mut f = firm();
        let pct = issue_shares(&mut f, 2_000_000.0).unwrap();
        assert!(pct > 0.0 && pct < MAX_PUBLIC_FLOAT_PCT);
        assert!(f.is_public);
        assert!((f.shares_total() - 100.0).abs() < 1e-9);
        assert!((f.shares["alice"] - (100.0 - pct)).abs() < 1e-9);

        let cash_before = f.cash;
        let cost = buyback_shares_to_go_private(&mut f).unwrap();
        assert!(cost > 0.0);
        assert!(!f.is_public);
        assert!((f.cash - (cash_before - cost)).abs() < 1e-6);
        assert!((f.shares["alice"] - 100.0).abs() < 1e-9);
        assert_eq!(buyback_shares_to_go_private(&mut f), Err(BusinessError::NotPublic));
    }

    #[test]
    fn float_is_capped() {
        let mut f = firm();
        let err = issue_shares(&mut f, 1.0e9).unwrap_err();
        assert!(matches!(err, BusinessError::FloatLimitExceeded(_)));
        assert!(!f.is_public);
    }
}
