//! Annuity mathematics for level-payment loans
//!
//! Every function here follows a silent-zero convention: a non-positive or
//! non-finite required input yields 0.0 instead of an error. Callers validate
//! their inputs once at the boundary (see `CalculationInput::validate`) and the
//! formulas themselves stay total.

/// Convert an annual nominal rate in percent (e.g. 3.09) to a monthly decimal rate
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    if !annual_rate_percent.is_finite() || annual_rate_percent <= 0.0 {
        return 0.0;
    }
    annual_rate_percent / 12.0 / 100.0
}

/// Longest loan duration accepted at the input boundary, in years
pub const MAX_DURATION_YEARS: u32 = 50;

/// Number of monthly periods in a duration expressed in years
pub fn periods(years: u32) -> u32 {
    years.saturating_mul(12)
}

/// Period count as a `powi` exponent, saturating instead of wrapping
pub(crate) fn exponent(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Present value of 1 per period for `n` periods at periodic rate `r`
///
/// `(1 - (1 + r)^-n) / r`, or `n` when `r` is zero.
pub fn annuity_factor(r: f64, n: u32) -> f64 {
    if n == 0 || !r.is_finite() || r < 0.0 {
        return 0.0;
    }
    if r == 0.0 {
        return n as f64;
    }
    (1.0 - (1.0 + r).powi(-exponent(n))) / r
}

/// Level payment amortizing `principal` over `n` periods at periodic rate `r`
pub fn payment_for_periods(principal: f64, r: f64, n: u32) -> f64 {
    if !principal.is_finite() || principal <= 0.0 || n == 0 {
        return 0.0;
    }
    if r == 0.0 {
        return principal / n as f64;
    }
    let factor = annuity_factor(r, n);
    if factor <= 0.0 {
        return 0.0;
    }
    principal / factor
}

/// Monthly payment for a loan quoted with an annual nominal rate in percent
///
/// Uses the straight-line `principal / n` when the rate is zero, otherwise
/// `P·r·(1+r)^n / ((1+r)^n − 1)`.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, years: u32) -> f64 {
    if !principal.is_finite() || principal <= 0.0 || years == 0 {
        return 0.0;
    }
    let n = periods(years);
    let r = monthly_rate(annual_rate_percent);
    if r == 0.0 {
        return principal / n as f64;
    }
    let growth = (1.0 + r).powi(exponent(n));
    if !growth.is_finite() {
        // Interest-only limit
        return principal * r;
    }
    principal * r * growth / (growth - 1.0)
}

/// Largest principal a monthly payment can amortize (inverse of `monthly_payment`)
pub fn max_loan(monthly_payment: f64, annual_rate_percent: f64, years: u32) -> f64 {
    if !monthly_payment.is_finite() || monthly_payment <= 0.0 || years == 0 {
        return 0.0;
    }
    let n = periods(years);
    let r = monthly_rate(annual_rate_percent);
    monthly_payment * annuity_factor(r, n)
}

/// Fully describes a standard annuity loan
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub duration_years: u32,
}

impl LoanTerms {
    pub fn new(principal: f64, annual_rate_percent: f64, duration_years: u32) -> Self {
        Self {
            principal,
            annual_rate_percent,
            duration_years,
        }
    }

    pub fn monthly_rate(&self) -> f64 {
        monthly_rate(self.annual_rate_percent)
    }

    pub fn periods(&self) -> u32 {
        periods(self.duration_years)
    }

    pub fn monthly_payment(&self) -> f64 {
        monthly_payment(self.principal, self.annual_rate_percent, self.duration_years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_reference_payment() {
        // 200k over 20 years at 3.09%
        let payment = monthly_payment(200_000.0, 3.09, 20);
        assert_abs_diff_eq!(payment, 1118.23, epsilon = 0.01);

        let first_interest = 200_000.0 * monthly_rate(3.09);
        assert_abs_diff_eq!(first_interest, 515.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        assert_relative_eq!(monthly_payment(120_000.0, 0.0, 10), 1000.0);
        assert_relative_eq!(max_loan(1000.0, 0.0, 10), 120_000.0);
        assert_relative_eq!(annuity_factor(0.0, 240), 240.0);
    }

    #[test]
    fn test_payment_and_max_loan_round_trip() {
        for &(principal, rate, years) in &[
            (50_000.0, 1.2, 7),
            (200_000.0, 3.09, 20),
            (350_000.0, 4.5, 25),
            (1_000_000.0, 6.75, 30),
        ] {
            let payment = monthly_payment(principal, rate, years);
            let rebuilt = max_loan(payment, rate, years);
            assert_relative_eq!(rebuilt, principal, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_periodic_payment_matches_annual_form() {
        let r = monthly_rate(3.5);
        assert_relative_eq!(
            payment_for_periods(180_000.0, r, 300),
            monthly_payment(180_000.0, 3.5, 25),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_silent_zero_on_degenerate_inputs() {
        assert_eq!(monthly_payment(0.0, 3.0, 20), 0.0);
        assert_eq!(monthly_payment(-5.0, 3.0, 20), 0.0);
        assert_eq!(monthly_payment(100_000.0, 3.0, 0), 0.0);
        assert_eq!(monthly_payment(f64::NAN, 3.0, 20), 0.0);
        assert_eq!(max_loan(0.0, 3.0, 20), 0.0);
        assert_eq!(max_loan(1000.0, 3.0, 0), 0.0);
        assert_eq!(annuity_factor(0.01, 0), 0.0);
        assert_eq!(monthly_rate(-1.0), 0.0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        assert_eq!(periods(u32::MAX), u32::MAX);
        assert_eq!(periods(MAX_DURATION_YEARS), 600);
        assert_relative_eq!(monthly_payment(100_000.0, 3.0, u32::MAX), 250.0, max_relative = 1e-12);
        assert_relative_eq!(annuity_factor(0.0025, u32::MAX), 400.0, max_relative = 1e-12);
    }
}
