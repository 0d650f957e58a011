//! Running balance of one loan tranche during a schedule projection

use super::cashflows::TrancheSlice;

/// State of a tranche at a point in time during projection
#[derive(Debug, Clone)]
pub struct TrancheState {
    /// Outstanding principal at beginning of period
    pub balance: f64,

    /// Monthly decimal rate
    pub monthly_rate: f64,

    /// Final month of the tranche (1-based)
    pub maturity: u32,
}

impl TrancheState {
    pub fn new(principal: f64, monthly_rate: f64, maturity: u32) -> Self {
        Self {
            balance: principal.max(0.0),
            monthly_rate,
            maturity,
        }
    }

    pub fn is_active(&self, period: u32) -> bool {
        period <= self.maturity && self.balance > 0.0
    }

    /// Apply one month's payment and return the split
    ///
    /// Interest accrues on the opening balance and the remainder of the payment
    /// amortizes principal. At maturity the balance is set to exactly zero, so
    /// rounding drift never survives the last period.
    pub fn advance(&mut self, period: u32, payment: f64) -> TrancheSlice {
        if !self.is_active(period) {
            return TrancheSlice::default();
        }

        let interest = self.balance * self.monthly_rate;
        let principal = payment - interest;
        self.balance = if period >= self.maturity {
            0.0
        } else {
            (self.balance - principal).max(0.0)
        };

        TrancheSlice {
            payment,
            principal,
            interest,
            balance: self.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_advance_splits_payment() {
        let mut state = TrancheState::new(1_000.0, 0.01, 2);
        let slice = state.advance(1, 507.51);
        assert_abs_diff_eq!(slice.interest, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(slice.principal + slice.interest, 507.51, epsilon = 1e-12);
        assert_abs_diff_eq!(state.balance, 502.49, epsilon = 1e-9);
    }

    #[test]
    fn test_balance_zeroed_at_maturity() {
        let mut state = TrancheState::new(1_000.0, 0.01, 2);
        state.advance(1, 507.51);
        let last = state.advance(2, 507.51);
        assert_eq!(last.balance, 0.0);
        assert!(!state.is_active(3));
        assert_eq!(state.advance(3, 507.51), TrancheSlice::default());
    }
}
