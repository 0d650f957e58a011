//! Gigogne (nested) dual-loan smoothing
//!
//! A long primary tranche (p1, r1, n1) and a shorter secondary tranche
//! (p2, r2, n2 ≤ n1) are repaid by one flat monthly amount M. While both run,
//! the secondary takes its own annuity m2 out of M and the primary gets the rest;
//! once the secondary matures the primary gets all of M.
//!
//! With A(r, n) the annuity factor:
//!   m2 = p2 / A(r2, n2)
//!   M  = (p1 + m2·A(r1, n2)) / A(r1, n1)
//!
//! The primary must not negatively amortize during the overlap:
//!   M − m2 ≥ p1·r1
//! Since its payment is level over the overlap, checking the opening balance is
//! enough: once principal starts falling, interest only shrinks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::cashflows::{payment_date, year_of, GigogneRow};
use super::state::TrancheState;
use crate::annuity::{
    annuity_factor, exponent, monthly_rate, payment_for_periods, periods, MAX_DURATION_YEARS,
};
use crate::solver::{Convergence, SolverSettings};

/// Slack on the no-negative-amortization check
const CONSTRAINT_EPSILON: f64 = 1e-6;

/// Rates and durations of the two tranches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GigogneTerms {
    pub primary_rate_percent: f64,
    pub primary_years: u32,
    pub secondary_rate_percent: f64,
    pub secondary_years: u32,
}

impl GigogneTerms {
    pub fn r1(&self) -> f64 {
        monthly_rate(self.primary_rate_percent)
    }

    pub fn n1(&self) -> u32 {
        periods(self.primary_years)
    }

    pub fn r2(&self) -> f64 {
        monthly_rate(self.secondary_rate_percent)
    }

    /// Secondary periods, never longer than the primary
    pub fn n2(&self) -> u32 {
        periods(self.secondary_years).min(self.n1())
    }
}

/// A primary/secondary split and its smoothed payments
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GigogneSplit {
    pub primary: f64,
    pub secondary: f64,
    /// Flat monthly payment M across both tranches
    pub blended_payment: f64,
    /// Secondary annuity m2, paid out of M during the overlap
    pub secondary_payment: f64,
}

impl GigogneSplit {
    pub fn total(&self) -> f64 {
        self.primary + self.secondary
    }

    /// Primary's share of M while the secondary is running
    pub fn primary_overlap_payment(&self) -> f64 {
        self.blended_payment - self.secondary_payment
    }

    /// True when the primary amortizes (or holds steady) through the overlap
    pub fn satisfies_constraint(&self, terms: &GigogneTerms) -> bool {
        self.primary_overlap_payment() >= self.primary * terms.r1() - CONSTRAINT_EPSILON
    }
}

/// Best secondary amount for a fixed total loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondaryOptimum {
    pub amount: f64,
    pub split: GigogneSplit,
    pub convergence: Convergence,
}

/// Borrowing capacity of a monthly budget under gigogne smoothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GigogneCapacity {
    pub total: f64,
    pub split: GigogneSplit,
    pub convergence: Convergence,
}

/// Smoothed payment for a given split
pub fn blended_payment(terms: &GigogneTerms, primary: f64, secondary: f64) -> GigogneSplit {
    let primary = primary.max(0.0);
    let secondary = secondary.max(0.0);
    let r1 = terms.r1();

    let m2 = payment_for_periods(secondary, terms.r2(), terms.n2());
    let a_full = annuity_factor(r1, terms.n1());
    let a_overlap = annuity_factor(r1, terms.n2());

    let blended = if a_full > 0.0 {
        (primary + m2 * a_overlap) / a_full
    } else {
        0.0
    };

    GigogneSplit {
        primary,
        secondary,
        blended_payment: blended,
        secondary_payment: m2,
    }
}

/// Largest whole secondary amount in `[0, min(max_allowed, total)]` that keeps
/// the primary from negatively amortizing
///
/// Feasibility is monotone in p2 (a larger secondary at a fixed total loan
/// shrinks the primary's headroom), so the search brackets the boundary and a
/// final unit-step correction pins the result to the largest feasible integer.
/// The answer therefore does not depend on the upper bound once that bound is
/// past the optimum.
pub fn optimal_secondary_amount(
    total_loan: f64,
    terms: &GigogneTerms,
    max_allowed: f64,
    settings: &SolverSettings,
) -> SecondaryOptimum {
    let total = total_loan.max(0.0);
    let upper = max_allowed.min(total).max(0.0);
    let feasible = |p2: f64| blended_payment(terms, total - p2, p2).satisfies_constraint(terms);

    let finish = |amount: f64, convergence: Convergence| SecondaryOptimum {
        amount,
        split: blended_payment(terms, total - amount, amount),
        convergence,
    };

    if !upper.is_finite() || upper <= 0.0 || !feasible(0.0) {
        return finish(0.0, Convergence::converged(0));
    }

    let mut low = 0.0_f64;
    let mut high = upper;
    let mut convergence = Convergence::converged(0);

    if feasible(upper) {
        low = upper;
    } else {
        convergence = Convergence::exhausted(settings.gigogne_max_iterations);
        for iteration in 1..=settings.gigogne_max_iterations {
            let mid = (low + high) / 2.0;
            if feasible(mid) {
                low = mid;
            } else {
                high = mid;
            }

            if high - low <= settings.gigogne_tolerance {
                convergence = Convergence::converged(iteration);
                break;
            }
        }
        if !convergence.converged {
            log::warn!(
                "secondary amount search stopped at the cap with bracket [{:.2}, {:.2}]",
                low,
                high
            );
        }
    }

    // Pin to the largest feasible whole amount
    let steps = settings.gigogne_tolerance.ceil().max(1.0) as u32 + 1;
    let mut amount = low.floor();
    for _ in 0..steps {
        if amount + 1.0 <= upper && feasible(amount + 1.0) {
            amount += 1.0;
        } else {
            break;
        }
    }
    for _ in 0..steps {
        if amount > 0.0 && !feasible(amount) {
            amount -= 1.0;
        } else {
            break;
        }
    }

    log::debug!("optimal secondary amount {:.0} of {:.2}", amount, total);
    finish(amount.max(0.0), convergence)
}

/// Total loan a monthly budget carries when split into gigogne tranches
///
/// At a fixed M the primary absorbs `p1 = M·A(r1,n1) − m2·A(r1,n2)`, so each
/// euro of secondary adds `1 − A(r1,n2)/A(r2,n2)` of capacity. When that gain
/// is positive the secondary is pushed to the constraint bound
/// `p2 ≤ M·v(r1,n1) / (a2·v(r1,n2))` (v the discount factor, a2 the secondary
/// payment per euro), capped by `max_secondary`. A binary search then trims p2
/// if rounding leaves the split infeasible.
pub fn max_loan_with_gigogne(
    budget: f64,
    terms: &GigogneTerms,
    max_secondary: f64,
    settings: &SolverSettings,
) -> GigogneCapacity {
    let (n1, n2) = (terms.n1(), terms.n2());
    if !budget.is_finite() || budget <= 0.0 || n1 == 0 {
        return GigogneCapacity {
            total: 0.0,
            split: GigogneSplit::default(),
            convergence: Convergence::converged(0),
        };
    }

    let r1 = terms.r1();
    let a_full = annuity_factor(r1, n1);
    let a_overlap = annuity_factor(r1, n2);
    let secondary_factor = annuity_factor(terms.r2(), n2);
    let per_euro_payment = if secondary_factor > 0.0 { 1.0 / secondary_factor } else { 0.0 };

    let split_for = |p2: f64| {
        let p1 = (budget * a_full - p2 * per_euro_payment * a_overlap).max(0.0);
        blended_payment(terms, p1, p2)
    };
    let feasible = |p2: f64| {
        let split = split_for(p2);
        split.satisfies_constraint(terms) && split.blended_payment <= budget + CONSTRAINT_EPSILON
    };

    let gain = 1.0 - per_euro_payment * a_overlap;
    let mut secondary = 0.0;
    if gain > 0.0 && max_secondary > 0.0 && per_euro_payment > 0.0 {
        let discount_full = (1.0 + r1).powi(-exponent(n1));
        let discount_overlap = (1.0 + r1).powi(-exponent(n2));
        let bound = budget * discount_full / (per_euro_payment * discount_overlap);
        secondary = bound.min(max_secondary).max(0.0);
    }

    let mut convergence = Convergence::converged(0);
    if secondary > 0.0 && !feasible(secondary) {
        let mut low = 0.0_f64;
        let mut high = secondary;
        convergence = Convergence::exhausted(settings.gigogne_max_iterations);
        for iteration in 1..=settings.gigogne_max_iterations {
            let mid = (low + high) / 2.0;
            if feasible(mid) {
                low = mid;
            } else {
                high = mid;
            }
            if high - low <= settings.gigogne_tolerance {
                convergence = Convergence::converged(iteration);
                break;
            }
        }
        secondary = low;
    }

    let split = split_for(secondary);
    GigogneCapacity {
        total: split.total(),
        split,
        convergence,
    }
}

/// Two-tranche schedule for a split
///
/// Each month the borrower pays the blended amount plus a constant insurance
/// premium. Each tranche's balance is set to exactly zero at its own maturity.
pub fn generate_gigogne_schedule(
    split: &GigogneSplit,
    terms: &GigogneTerms,
    monthly_insurance: f64,
    first_payment_date: Option<NaiveDate>,
) -> Vec<GigogneRow> {
    let (n1, n2) = (terms.n1(), terms.n2());
    if n1 == 0 || split.total() <= 0.0 {
        return Vec::new();
    }

    let insurance = monthly_insurance.max(0.0);
    let mut primary = TrancheState::new(split.primary, terms.r1(), n1);
    let mut secondary = TrancheState::new(split.secondary, terms.r2(), n2);
    let mut rows = Vec::with_capacity(n1.min(periods(MAX_DURATION_YEARS)) as usize);
    let mut cumulative_paid = 0.0;

    for period in 1..=n1 {
        let secondary_due = if secondary.is_active(period) { split.secondary_payment } else { 0.0 };
        let primary_due = if primary.is_active(period) {
            split.blended_payment - secondary_due
        } else {
            0.0
        };

        let primary_slice = primary.advance(period, primary_due);
        let secondary_slice = secondary.advance(period, secondary_due);
        let payment = primary_slice.payment + secondary_slice.payment;
        cumulative_paid += payment + insurance;

        rows.push(GigogneRow {
            period,
            year: year_of(period),
            payment_date: payment_date(first_payment_date, period),
            payment,
            primary: primary_slice,
            secondary: secondary_slice,
            insurance,
            cumulative_paid,
            remaining_principal: primary_slice.balance + secondary_slice.balance,
        });
    }

    rows
}
