//! Bounded iterative solvers
//!
//! Every loop here has a fixed iteration cap. Hitting the cap is not an error:
//! the solver returns its last estimate together with a `Convergence` record so
//! callers (and tests) can tell a converged answer from an exhausted one.

pub mod affordability;
pub mod effective_rate;

pub use affordability::{
    monthly_budget, optimize_price_with_insurance, required_loan, solve_max_price,
    LoanSolution, PriceSolution, PurchaseContext,
};
pub use effective_rate::{effective_rate, EffectiveRate};

use serde::{Deserialize, Serialize};

/// Outcome of a bounded loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Convergence {
    pub converged: bool,
    pub iterations: u32,
}

impl Convergence {
    pub fn converged(iterations: u32) -> Self {
        Self { converged: true, iterations }
    }

    pub fn exhausted(iterations: u32) -> Self {
        Self { converged: false, iterations }
    }
}

/// Tolerances and caps for all solvers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Price fixed point: stop when |Δprice| is within this many euros
    pub price_tolerance: f64,
    pub price_max_iterations: u32,

    /// Required-loan fixed point
    pub loan_tolerance: f64,
    pub loan_max_iterations: u32,
    /// Initial all-in fee guess as a share of the price
    pub flat_fee_guess: f64,

    /// Insurance-aware binary search over price
    pub search_tolerance: f64,
    pub search_max_iterations: u32,

    /// Effective rate root finder
    pub rate_tolerance: f64,
    pub rate_max_iterations: u32,
    /// Upper clamp on candidate monthly rates
    pub max_monthly_rate: f64,

    /// Gigogne secondary-amount search
    pub gigogne_tolerance: f64,
    pub gigogne_max_iterations: u32,

    /// Share of monthly income that may go to loan payments (insurance included)
    pub max_debt_ratio: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            price_tolerance: 100.0,
            price_max_iterations: 10,
            loan_tolerance: 100.0,
            loan_max_iterations: 10,
            flat_fee_guess: 0.08,
            search_tolerance: 100.0,
            search_max_iterations: 30,
            rate_tolerance: 1e-10,
            rate_max_iterations: 100,
            max_monthly_rate: 0.10,
            gigogne_tolerance: 1.0,
            gigogne_max_iterations: 60,
            max_debt_ratio: 0.35,
        }
    }
}
