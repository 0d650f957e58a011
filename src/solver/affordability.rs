//! Affordability solvers
//!
//! Two circular problems are solved by bounded fixed-point iteration:
//! - the maximum price a given loan capacity buys once notary fees are paid
//!   (fees depend on the price, the price depends on the fees)
//! - the loan a chosen price requires (the guarantee fee depends on the loan)
//!
//! A binary search over price then folds in borrower insurance.

use serde::{Deserialize, Serialize};

use super::{Convergence, SolverSettings};
use crate::assumptions::{FeeBreakdown, FeeSchedule, PropertyCategory};

/// Fixed inputs of a purchase that every solver iteration shares
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseContext {
    /// Own funds put into the purchase
    pub capital: f64,
    pub category: PropertyCategory,
    /// Lender dossier fee, paid once
    pub dossier_fee: f64,
}

/// Result of a maximum-price solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSolution {
    pub max_price: f64,
    /// Loan financing that price
    pub loan: f64,
    pub fees: FeeBreakdown,
    pub convergence: Convergence,
}

impl PriceSolution {
    fn zero() -> Self {
        Self {
            max_price: 0.0,
            loan: 0.0,
            fees: FeeBreakdown::default(),
            convergence: Convergence::converged(0),
        }
    }
}

/// Result of a required-loan solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanSolution {
    pub required_loan: f64,
    pub fees: FeeBreakdown,
    pub convergence: Convergence,
}

/// Monthly amount available for loan payments (insurance included)
pub fn monthly_budget(monthly_income: f64, monthly_charges: f64, max_debt_ratio: f64) -> f64 {
    if !monthly_income.is_finite() || monthly_income <= 0.0 {
        return 0.0;
    }
    (monthly_income * max_debt_ratio - monthly_charges.max(0.0)).max(0.0)
}

/// Largest price `capital + max_loan` buys once purchase fees are paid
///
/// Iterates `price = capital + max_loan − fees(price)` from `capital + max_loan`
/// until the price moves by less than the tolerance. At the cap the last
/// estimate is returned with `converged = false`.
pub fn solve_max_price(
    max_loan: f64,
    ctx: &PurchaseContext,
    fees: &FeeSchedule,
    settings: &SolverSettings,
) -> PriceSolution {
    let capital = ctx.capital.max(0.0);
    let max_loan = max_loan.max(0.0);
    let available = capital + max_loan;
    if !available.is_finite() || available <= 0.0 {
        return PriceSolution::zero();
    }

    let guarantee = fees.guarantee_fee(max_loan);
    let dossier = ctx.dossier_fee.max(0.0);
    let mut price = available;
    let mut convergence = Convergence::exhausted(settings.price_max_iterations);

    for iteration in 1..=settings.price_max_iterations {
        let total_fees = fees.notary_fees(price, ctx.category) + guarantee + dossier;
        let next = (available - total_fees).max(0.0);
        let delta = (next - price).abs();
        log::debug!("max price iteration {}: price={:.2} delta={:.2}", iteration, next, delta);
        price = next;

        if delta <= settings.price_tolerance {
            convergence = Convergence::converged(iteration);
            break;
        }
    }

    if !convergence.converged {
        log::warn!(
            "max price did not converge in {} iterations, using {:.2}",
            settings.price_max_iterations,
            price
        );
    }

    PriceSolution {
        max_price: price,
        loan: max_loan,
        fees: fees.breakdown(price, ctx.category, max_loan, dossier),
        convergence,
    }
}

/// Loan needed to buy at `price` once fees are financed
///
/// Starts from a flat fee guess and iterates
/// `loan = price + notary + dossier + guarantee(loan) − capital`, clamped at
/// zero. A zero loan ends the loop immediately: capital covers the purchase.
pub fn required_loan(
    price: f64,
    ctx: &PurchaseContext,
    fees: &FeeSchedule,
    settings: &SolverSettings,
) -> LoanSolution {
    if !price.is_finite() || price <= 0.0 {
        return LoanSolution {
            required_loan: 0.0,
            fees: FeeBreakdown::default(),
            convergence: Convergence::converged(0),
        };
    }

    let capital = ctx.capital.max(0.0);
    let dossier = ctx.dossier_fee.max(0.0);
    let notary = fees.notary_fees(price, ctx.category);
    let need_before_guarantee = price + notary + dossier - capital;

    let mut loan = (price * (1.0 + settings.flat_fee_guess) - capital).max(0.0);
    let mut convergence = Convergence::exhausted(settings.loan_max_iterations);

    for iteration in 1..=settings.loan_max_iterations {
        let next = (need_before_guarantee + fees.guarantee_fee(loan)).max(0.0);
        let delta = (next - loan).abs();
        log::debug!("required loan iteration {}: loan={:.2} delta={:.2}", iteration, next, delta);
        loan = next;

        if loan <= 0.0 || delta <= settings.loan_tolerance {
            convergence = Convergence::converged(iteration);
            break;
        }
    }

    if !convergence.converged {
        log::warn!(
            "required loan did not converge in {} iterations, using {:.2}",
            settings.loan_max_iterations,
            loan
        );
    }

    LoanSolution {
        required_loan: loan,
        fees: FeeBreakdown::new(notary, fees.guarantee_fee(loan), dossier),
        convergence,
    }
}

/// Highest price whose financing fits the budget once insurance is counted
///
/// Binary search over `[0, upper_price]`. A price is affordable when
/// `monthly_cost(required_loan(price)) <= budget`.
///
/// Precondition: `monthly_cost` and the fee formulas are non-decreasing, so
/// affordability is monotone in price. A non-monotone configuration would make
/// the search return a wrong boundary without any error.
pub fn optimize_price_with_insurance<F>(
    upper_price: f64,
    budget: f64,
    ctx: &PurchaseContext,
    fees: &FeeSchedule,
    settings: &SolverSettings,
    monthly_cost: F,
) -> PriceSolution
where
    F: Fn(f64) -> f64,
{
    if !upper_price.is_finite() || upper_price <= 0.0 {
        return PriceSolution::zero();
    }

    let solve = |price: f64| {
        let loan = required_loan(price, ctx, fees, settings);
        let affordable = monthly_cost(loan.required_loan) <= budget + 1e-9;
        (loan, affordable)
    };

    let into_solution = |price: f64, loan: LoanSolution, convergence: Convergence| PriceSolution {
        max_price: price,
        loan: loan.required_loan,
        fees: loan.fees,
        convergence,
    };

    let (upper_loan, upper_ok) = solve(upper_price);
    if upper_ok {
        return into_solution(upper_price, upper_loan, Convergence::converged(1));
    }

    let mut low = 0.0_f64;
    let mut high = upper_price;
    let mut convergence = Convergence::exhausted(settings.search_max_iterations);

    for iteration in 1..=settings.search_max_iterations {
        let mid = (low + high) / 2.0;
        let (_, affordable) = solve(mid);
        if affordable {
            low = mid;
        } else {
            high = mid;
        }

        if high - low <= settings.search_tolerance {
            convergence = Convergence::converged(iteration);
            break;
        }
    }

    if !convergence.converged {
        log::warn!(
            "insurance-aware price search stopped at the cap with bracket [{:.2}, {:.2}]",
            low,
            high
        );
    }

    let (loan, _) = solve(low);
    into_solution(low, loan, convergence)
}
