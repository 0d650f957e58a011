//! Borrower insurance by age bracket
//!
//! The premium is a flat annual rate applied to the *initial* principal and
//! held constant for the whole loan. It does not decay with amortization.

use serde::{Deserialize, Serialize};

/// One age bracket: applies up to and including `max_age` (None = open ended)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsuranceBracket {
    pub max_age: Option<u32>,
    /// Annual rate as a decimal (0.0025 = 0.25%)
    pub annual_rate: f64,
}

/// Age-bracketed annual insurance rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceSchedule {
    brackets: Vec<InsuranceBracket>,
}

impl InsuranceSchedule {
    /// Build from brackets, ordering them by upper age with the open bracket last
    pub fn new(mut brackets: Vec<InsuranceBracket>) -> Self {
        brackets.sort_by_key(|b| b.max_age.unwrap_or(u32::MAX));
        Self { brackets }
    }

    /// Default group-contract rates for the five standard brackets
    pub fn default_brackets() -> Self {
        Self::new(vec![
            InsuranceBracket { max_age: Some(25), annual_rate: 0.0010 },
            InsuranceBracket { max_age: Some(40), annual_rate: 0.0015 },
            InsuranceBracket { max_age: Some(50), annual_rate: 0.0025 },
            InsuranceBracket { max_age: Some(65), annual_rate: 0.0040 },
            InsuranceBracket { max_age: None, annual_rate: 0.0060 },
        ])
    }

    pub fn brackets(&self) -> &[InsuranceBracket] {
        &self.brackets
    }

    /// Annual insurance rate (decimal) for a borrower age
    ///
    /// A missing or zero age means no insurance is priced.
    pub fn rate_for_age(&self, age: Option<u32>) -> f64 {
        let age = match age {
            Some(a) if a > 0 => a,
            _ => return 0.0,
        };
        self.brackets
            .iter()
            .find(|b| b.max_age.map_or(true, |max| age <= max))
            .or_else(|| self.brackets.last())
            .map(|b| b.annual_rate)
            .unwrap_or(0.0)
    }
}

impl Default for InsuranceSchedule {
    fn default() -> Self {
        Self::default_brackets()
    }
}

/// Constant monthly insurance premium on the initial principal
pub fn monthly_insurance(principal: f64, annual_rate: f64) -> f64 {
    let valid_principal = principal.is_finite() && principal > 0.0;
    if !valid_principal || !annual_rate.is_finite() || annual_rate <= 0.0 {
        return 0.0;
    }
    principal * annual_rate / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bracket_boundaries() {
        let schedule = InsuranceSchedule::default_brackets();

        assert_eq!(schedule.rate_for_age(Some(18)), 0.0010);
        assert_eq!(schedule.rate_for_age(Some(25)), 0.0010);
        assert_eq!(schedule.rate_for_age(Some(26)), 0.0015);
        assert_eq!(schedule.rate_for_age(Some(40)), 0.0015);
        assert_eq!(schedule.rate_for_age(Some(50)), 0.0025);
        assert_eq!(schedule.rate_for_age(Some(65)), 0.0040);
        assert_eq!(schedule.rate_for_age(Some(66)), 0.0060);
        assert_eq!(schedule.rate_for_age(Some(90)), 0.0060);
    }

    #[test]
    fn test_missing_age_means_no_insurance() {
        let schedule = InsuranceSchedule::default_brackets();
        assert_eq!(schedule.rate_for_age(None), 0.0);
        assert_eq!(schedule.rate_for_age(Some(0)), 0.0);
    }

    #[test]
    fn test_rate_never_decreases_with_age() {
        let schedule = InsuranceSchedule::default_brackets();
        let mut previous = 0.0;
        for age in 1..=100 {
            let rate = schedule.rate_for_age(Some(age));
            assert!(rate >= previous, "rate dropped at age {}", age);
            previous = rate;
        }
    }

    #[test]
    fn test_monthly_insurance() {
        assert_relative_eq!(monthly_insurance(200_000.0, 0.0015), 25.0);
        assert_eq!(monthly_insurance(0.0, 0.0015), 0.0);
        assert_eq!(monthly_insurance(200_000.0, 0.0), 0.0);
    }

    #[test]
    fn test_unordered_brackets_are_sorted() {
        let schedule = InsuranceSchedule::new(vec![
            InsuranceBracket { max_age: None, annual_rate: 0.01 },
            InsuranceBracket { max_age: Some(30), annual_rate: 0.001 },
        ]);
        assert_eq!(schedule.brackets()[0].max_age, Some(30));
        assert_eq!(schedule.brackets()[1].max_age, None);
        assert_eq!(schedule.rate_for_age(Some(20)), 0.001);
        assert_eq!(schedule.rate_for_age(Some(31)), 0.01);
    }
}
