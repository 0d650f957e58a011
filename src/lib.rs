//! Mortgage Engine - Affordability, fees, amortization and effective rate for home loans
//!
//! This library provides:
//! - Monthly budget from incomes, charges and a maximum debt ratio
//! - Notary, guarantee and dossier fees with fixed-point loan/price solvers
//! - Maximum affordable price with borrower insurance folded in
//! - Amortization schedules for single loans and gigogne (dual-tranche) splits
//! - Effective annual rate (TAEG) on the net amount received
//! - Parallel batch and duration-sweep recalculation

pub mod annuity;
pub mod assumptions;
pub mod borrower;
pub mod error;
pub mod projection;
pub mod scenario;
pub mod solver;

// Re-export commonly used types
pub use annuity::LoanTerms;
pub use assumptions::{Assumptions, FeeSchedule, InsuranceSchedule, PropertyCategory, RateTable};
pub use borrower::{BudgetItem, CalculationInput, GigogneConfig, Recurrence};
pub use error::{MortgageError, MortgageResult};
pub use projection::{AmortizationRow, GigogneRow, Schedule, ScheduleSummary};
pub use scenario::{CalculationResult, Calculator, CostSummary, GigogneOutcome};
pub use solver::{Convergence, SolverSettings};
