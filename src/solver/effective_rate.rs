//! Effective annual rate (TAEG)
//!
//! Finds the annual rate at which a plain annuity on the net loan costs exactly
//! the borrower's real monthly outlay (principal, interest and insurance).
//! Newton-Raphson on the monthly rate, with a bisection fallback when Newton
//! leaves the clamp band or runs out of iterations. The payment is strictly
//! increasing in the rate, so bisection always brackets the root when one exists.

use serde::{Deserialize, Serialize};

use super::{Convergence, SolverSettings};
use crate::annuity::{exponent, monthly_rate, payment_for_periods, periods};

/// Number of consecutive clamp hits after which Newton is abandoned
const MAX_CLAMP_HITS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveRate {
    /// Annual rate in percent, on the same nominal (×12) convention as the input rate
    pub annual_rate_percent: f64,
    pub convergence: Convergence,
}

/// Payment at monthly rate `r` and its derivative with respect to `r`
fn payment_and_derivative(loan: f64, r: f64, n: u32) -> (f64, f64) {
    let v = (1.0 + r).powi(-exponent(n));
    let one_minus_v = 1.0 - v;
    let payment = loan * r / one_minus_v;
    let dv = -(n as f64) * (1.0 + r).powi(-exponent(n) - 1);
    let derivative = loan * (one_minus_v + r * dv) / (one_minus_v * one_minus_v);
    (payment, derivative)
}

/// Effective annual rate for a loan repaid by `actual_payment` per month
///
/// Degenerate inputs (no loan, no duration, no payment) yield 0. The result is
/// never below `nominal_rate_percent`: a payment that does not exceed the
/// nominal annuity returns the nominal rate.
pub fn effective_rate(
    net_loan: f64,
    actual_payment: f64,
    years: u32,
    nominal_rate_percent: f64,
    settings: &SolverSettings,
) -> EffectiveRate {
    let n = periods(years);
    let no_loan = !net_loan.is_finite() || net_loan <= 0.0 || n == 0;
    if no_loan || !actual_payment.is_finite() || actual_payment <= 0.0 {
        return EffectiveRate {
            annual_rate_percent: 0.0,
            convergence: Convergence::converged(0),
        };
    }

    let nominal = nominal_rate_percent.max(0.0);
    let nominal_r = monthly_rate(nominal);
    let floor_payment = payment_for_periods(net_loan, nominal_r, n);
    if actual_payment <= floor_payment {
        return EffectiveRate {
            annual_rate_percent: nominal,
            convergence: Convergence::converged(0),
        };
    }

    let low_clamp = nominal_r.max(1e-12);
    let high_clamp = settings.max_monthly_rate;
    let to_annual = |r: f64| (r * 12.0 * 100.0).max(nominal);

    let newton_root = newton(
        net_loan,
        actual_payment,
        n,
        floor_payment,
        low_clamp,
        high_clamp,
        settings,
    );
    if let Some((r, iterations)) = newton_root {
        return EffectiveRate {
            annual_rate_percent: to_annual(r),
            convergence: Convergence::converged(iterations),
        };
    }

    log::debug!("effective rate: Newton failed, falling back to bisection");
    let (r, convergence) = bisection(net_loan, actual_payment, n, nominal_r, high_clamp, settings);
    if !convergence.converged {
        log::warn!("effective rate did not converge, returning best estimate");
    }

    EffectiveRate {
        annual_rate_percent: to_annual(r),
        convergence,
    }
}

fn newton(
    loan: f64,
    target: f64,
    n: u32,
    floor_payment: f64,
    low: f64,
    high: f64,
    settings: &SolverSettings,
) -> Option<(f64, u32)> {
    // Seed: nominal rate plus the insurance load spread over the loan
    let mut r = (low + (target - floor_payment) / loan).clamp(low, high);
    let mut clamp_hits = 0;

    for iteration in 1..=settings.rate_max_iterations {
        let (payment, derivative) = payment_and_derivative(loan, r, n);
        let f = payment - target;
        if !f.is_finite() || !derivative.is_finite() || derivative <= 0.0 {
            return None;
        }

        let raw = r - f / derivative;
        let next = raw.clamp(low, high);
        if next != raw {
            // A clamped step is never accepted as a root
            clamp_hits += 1;
            if clamp_hits >= MAX_CLAMP_HITS {
                return None;
            }
            r = next;
            continue;
        }
        clamp_hits = 0;

        if (next - r).abs() < settings.rate_tolerance {
            return Some((next, iteration));
        }
        r = next;
    }

    None
}

fn bisection(
    loan: f64,
    target: f64,
    n: u32,
    nominal_r: f64,
    high: f64,
    settings: &SolverSettings,
) -> (f64, Convergence) {
    let f = |r: f64| payment_for_periods(loan, r, n) - target;

    // No root below the clamp: the payment is implausibly high
    if f(high) < 0.0 {
        return (nominal_r, Convergence::exhausted(0));
    }

    let mut low = nominal_r;
    let mut high = high;

    for iteration in 1..=settings.rate_max_iterations {
        let mid = (low + high) / 2.0;
        if f(mid) < 0.0 {
            low = mid;
        } else {
            high = mid;
        }

        if high - low < settings.rate_tolerance {
            return ((low + high) / 2.0, Convergence::converged(iteration));
        }
    }

    ((low + high) / 2.0, Convergence::exhausted(settings.rate_max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annuity::monthly_payment;
    use crate::assumptions::monthly_insurance;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_no_insurance_returns_nominal() {
        let settings = SolverSettings::default();
        let payment = monthly_payment(200_000.0, 3.09, 20);
        let taeg = effective_rate(200_000.0, payment, 20, 3.09, &settings);
        assert_abs_diff_eq!(taeg.annual_rate_percent, 3.09, epsilon = 1e-6);
    }

    #[test]
    fn test_insurance_raises_effective_rate() {
        let settings = SolverSettings::default();
        let loan = 200_000.0;
        let actual = monthly_payment(loan, 3.09, 20) + monthly_insurance(loan, 0.0025);

        let taeg = effective_rate(loan, actual, 20, 3.09, &settings);
        assert!(taeg.convergence.converged);
        assert!(taeg.annual_rate_percent > 3.09);

        // The solved rate reproduces the actual payment
        let rebuilt = monthly_payment(loan, taeg.annual_rate_percent, 20);
        assert_relative_eq!(rebuilt, actual, max_relative = 1e-8);
    }

    #[test]
    fn test_effective_rate_at_least_nominal_across_inputs() {
        let settings = SolverSettings::default();
        for &(loan, rate, years, insurance) in &[
            (80_000.0, 1.5, 10, 0.0010),
            (150_000.0, 2.95, 15, 0.0015),
            (320_000.0, 3.2, 25, 0.0040),
            (500_000.0, 4.8, 30, 0.0060),
        ] {
            let actual = monthly_payment(loan, rate, years) + monthly_insurance(loan, insurance);
            let taeg = effective_rate(loan, actual, years, rate, &settings);
            assert!(taeg.annual_rate_percent >= rate);
            assert!(taeg.convergence.converged);
        }
    }

    #[test]
    fn test_zero_nominal_rate() {
        let settings = SolverSettings::default();
        // 120k over 10 years at 0% plus 20/month insurance
        let taeg = effective_rate(120_000.0, 1_020.0, 10, 0.0, &settings);
        assert!(taeg.annual_rate_percent > 0.0);
        let rebuilt = monthly_payment(120_000.0, taeg.annual_rate_percent, 10);
        assert_relative_eq!(rebuilt, 1_020.0, max_relative = 1e-8);
    }

    #[test]
    fn test_bisection_fallback_when_newton_is_starved() {
        let settings = SolverSettings {
            rate_max_iterations: 1,
            ..Default::default()
        };
        let loan = 200_000.0;
        let actual = monthly_payment(loan, 3.09, 20) + 50.0;
        let taeg = effective_rate(loan, actual, 20, 3.09, &settings);
        assert!(!taeg.convergence.converged);
        assert!(taeg.annual_rate_percent >= 3.09);
    }

    #[test]
    fn test_absurd_payment_returns_nominal_floor() {
        let settings = SolverSettings::default();
        let taeg = effective_rate(10_000.0, 50_000.0, 20, 3.0, &settings);
        assert_eq!(taeg.annual_rate_percent, 3.0);
        assert!(!taeg.convergence.converged);
    }

    #[test]
    fn test_degenerate_inputs() {
        let settings = SolverSettings::default();
        for taeg in [
            effective_rate(0.0, 1_000.0, 20, 3.0, &settings),
            effective_rate(100_000.0, 0.0, 20, 3.0, &settings),
            effective_rate(100_000.0, 1_000.0, 0, 3.0, &settings),
        ] {
            assert_eq!(taeg.annual_rate_percent, 0.0);
            // Nothing to solve is not a solver failure
            assert_eq!(taeg.convergence, Convergence::converged(0));
        }
    }
}
