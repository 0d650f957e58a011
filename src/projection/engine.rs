//! Month-by-month amortization of a single annuity loan

use chrono::NaiveDate;

use super::cashflows::{payment_date, AmortizationRow};
use super::state::TrancheState;
use crate::annuity::{periods, LoanTerms, MAX_DURATION_YEARS};

/// Configuration for a schedule run
#[derive(Debug, Clone, Default)]
pub struct ScheduleConfig {
    /// Date of the first instalment; rows are undated when absent
    pub first_payment_date: Option<NaiveDate>,
}

/// Single-loan amortization engine
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    config: ScheduleConfig,
}

impl AmortizationEngine {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// Build the full schedule for `terms` with a constant monthly insurance premium
    ///
    /// The schedule has `duration_years * 12` rows, or none for a zero principal
    /// or duration. The last row's remaining principal is exactly zero.
    pub fn project(&self, terms: &LoanTerms, monthly_insurance: f64) -> Vec<AmortizationRow> {
        let n = terms.periods();
        let payment = terms.monthly_payment();
        if n == 0 || payment <= 0.0 {
            return Vec::new();
        }

        let insurance = monthly_insurance.max(0.0);
        let mut state = TrancheState::new(terms.principal, terms.monthly_rate(), n);
        let mut rows = Vec::with_capacity(n.min(periods(MAX_DURATION_YEARS)) as usize);
        let mut cumulative_paid = 0.0;

        for period in 1..=n {
            let slice = state.advance(period, payment);
            cumulative_paid += payment + insurance;

            let mut row = AmortizationRow::new(period);
            row.payment_date = payment_date(self.config.first_payment_date, period);
            row.payment = slice.payment;
            row.principal = slice.principal;
            row.interest = slice.interest;
            row.insurance = insurance;
            row.cumulative_paid = cumulative_paid;
            row.remaining_principal = slice.balance;
            rows.push(row);
        }

        rows
    }
}
