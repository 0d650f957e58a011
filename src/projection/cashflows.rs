//! Schedule output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single month of a one-loan amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    // Timing
    /// 1-based month
    pub period: u32,
    /// ceil(period / 12)
    pub year: u32,
    pub payment_date: Option<NaiveDate>,

    // Payment split (principal + interest == payment)
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub insurance: f64,

    // Running totals
    pub cumulative_paid: f64,
    pub remaining_principal: f64,
}

impl AmortizationRow {
    pub fn new(period: u32) -> Self {
        Self {
            period,
            year: year_of(period),
            payment_date: None,
            payment: 0.0,
            principal: 0.0,
            interest: 0.0,
            insurance: 0.0,
            cumulative_paid: 0.0,
            remaining_principal: 0.0,
        }
    }
}

/// One tranche's share of a month in a gigogne schedule
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrancheSlice {
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    /// Balance after this month's payment
    pub balance: f64,
}

/// A single month of a two-tranche (gigogne) schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GigogneRow {
    pub period: u32,
    pub year: u32,
    pub payment_date: Option<NaiveDate>,

    /// Blended payment for both tranches (excluding insurance)
    pub payment: f64,
    pub primary: TrancheSlice,
    pub secondary: TrancheSlice,
    pub insurance: f64,

    pub cumulative_paid: f64,
    pub remaining_principal: f64,
}

impl GigogneRow {
    pub fn interest(&self) -> f64 {
        self.primary.interest + self.secondary.interest
    }

    pub fn principal(&self) -> f64 {
        self.primary.principal + self.secondary.principal
    }
}

/// Year index (1-based) for a 1-based period
pub fn year_of(period: u32) -> u32 {
    period.div_ceil(12)
}

/// Payment date for a 1-based period, one calendar month apart from the first
pub fn payment_date(first: Option<NaiveDate>, period: u32) -> Option<NaiveDate> {
    first.and_then(|d| d.checked_add_months(chrono::Months::new(period.saturating_sub(1))))
}

/// A complete schedule, single loan or gigogne
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "lowercase")]
pub enum Schedule {
    Single(Vec<AmortizationRow>),
    Gigogne(Vec<GigogneRow>),
}

impl Schedule {
    pub fn len(&self) -> usize {
        match self {
            Schedule::Single(rows) => rows.len(),
            Schedule::Gigogne(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get summary statistics
    pub fn summary(&self) -> ScheduleSummary {
        match self {
            Schedule::Single(rows) => ScheduleSummary {
                total_months: rows.len() as u32,
                total_paid: rows.last().map(|r| r.cumulative_paid).unwrap_or(0.0),
                total_interest: rows.iter().map(|r| r.interest).sum(),
                total_insurance: rows.iter().map(|r| r.insurance).sum(),
                final_balance: rows.last().map(|r| r.remaining_principal).unwrap_or(0.0),
            },
            Schedule::Gigogne(rows) => ScheduleSummary {
                total_months: rows.len() as u32,
                total_paid: rows.last().map(|r| r.cumulative_paid).unwrap_or(0.0),
                total_interest: rows.iter().map(|r| r.interest()).sum(),
                total_insurance: rows.iter().map(|r| r.insurance).sum(),
                final_balance: rows.last().map(|r| r.remaining_principal).unwrap_or(0.0),
            },
        }
    }
}

/// Summary statistics for a schedule
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_months: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub total_insurance: f64,
    pub final_balance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_index() {
        assert_eq!(year_of(1), 1);
        assert_eq!(year_of(12), 1);
        assert_eq!(year_of(13), 2);
        assert_eq!(year_of(240), 20);
    }

    #[test]
    fn test_payment_dates_step_by_month() {
        let first = NaiveDate::from_ymd_opt(2026, 1, 31);
        assert_eq!(payment_date(first, 1), first);
        assert_eq!(payment_date(first, 2), NaiveDate::from_ymd_opt(2026, 2, 28));
        assert_eq!(payment_date(first, 13), NaiveDate::from_ymd_opt(2027, 1, 31));
        assert_eq!(payment_date(None, 5), None);
    }
}
