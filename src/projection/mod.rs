//! Amortization schedules for single loans and gigogne splits

mod cashflows;
mod engine;
mod state;
pub mod gigogne;

pub use cashflows::{AmortizationRow, GigogneRow, Schedule, ScheduleSummary, TrancheSlice};
pub use engine::{AmortizationEngine, ScheduleConfig};
pub use gigogne::{
    blended_payment, generate_gigogne_schedule, max_loan_with_gigogne, optimal_secondary_amount,
    GigogneCapacity, GigogneSplit, GigogneTerms, SecondaryOptimum,
};
pub use state::TrancheState;
