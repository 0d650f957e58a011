//! Acquisition and lending fees
//!
//! - Notary fees: regulated émoluments on a regressive sliding scale, transfer
//!   tax by property category, fixed disbursements and the security contribution
//! - Guarantee fee: two-tier commission plus a mutual guarantee fund share
//!
//! Tier boundaries are inclusive on the lower tier: a price exactly on a
//! boundary takes nothing from the tier above it.

use serde::{Deserialize, Serialize};

/// Property category, drives the transfer tax rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyCategory {
    /// New build (VEFA), reduced transfer tax
    New,
    /// Pre-owned property, full transfer tax
    #[default]
    Old,
}

/// One slice of the émoluments scale, applied to the part of the price above `lower_bound`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotaryTier {
    pub lower_bound: f64,
    pub rate: f64,
}

/// Guarantee ("caution") pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuaranteeSchedule {
    /// Loan amount where the commission switches from flat to marginal
    pub threshold: f64,
    /// Flat commission rate up to the threshold
    pub base_rate: f64,
    /// Fixed commission above the threshold
    pub fixed_above: f64,
    /// Commission rate on the part of the loan above the threshold
    pub marginal_rate: f64,
    /// Mutual guarantee fund contribution on the whole loan
    pub mutual_fund_rate: f64,
    /// Floor on the total guarantee fee
    pub minimum: f64,
}

impl Default for GuaranteeSchedule {
    fn default() -> Self {
        Self {
            threshold: 50_000.0,
            base_rate: 0.010,
            fixed_above: 500.0,
            marginal_rate: 0.004,
            mutual_fund_rate: 0.008,
            minimum: 500.0,
        }
    }
}

/// All fee parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Émoluments scale, sorted by lower bound
    notary_tiers: Vec<NotaryTier>,
    /// Multiplier applied to the émoluments (VAT)
    pub vat_factor: f64,
    pub transfer_tax_new: f64,
    pub transfer_tax_old: f64,
    /// Fixed notary disbursements
    pub disbursements: f64,
    pub security_contribution_rate: f64,
    pub security_contribution_min: f64,
    pub guarantee: GuaranteeSchedule,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            notary_tiers: Self::default_notary_tiers(),
            vat_factor: 1.20,
            transfer_tax_new: 0.00715,
            transfer_tax_old: 0.0580665,
            disbursements: 1_200.0,
            security_contribution_rate: 0.001,
            security_contribution_min: 15.0,
            guarantee: GuaranteeSchedule::default(),
        }
    }
}

impl FeeSchedule {
    /// Regulated four-tier émoluments scale
    pub fn default_notary_tiers() -> Vec<NotaryTier> {
        vec![
            NotaryTier { lower_bound: 0.0, rate: 0.03870 },
            NotaryTier { lower_bound: 6_500.0, rate: 0.01596 },
            NotaryTier { lower_bound: 17_000.0, rate: 0.01064 },
            NotaryTier { lower_bound: 60_000.0, rate: 0.00799 },
        ]
    }

    pub fn with_notary_tiers(mut self, mut tiers: Vec<NotaryTier>) -> Self {
        tiers.sort_by(|a, b| a.lower_bound.total_cmp(&b.lower_bound));
        self.notary_tiers = tiers;
        self
    }

    pub fn notary_tiers(&self) -> &[NotaryTier] {
        &self.notary_tiers
    }

    /// Émoluments including VAT
    pub fn notary_emoluments(&self, price: f64) -> f64 {
        if !price.is_finite() || price <= 0.0 {
            return 0.0;
        }

        // Walk from the top tier down; each tier takes the slice strictly above its bound
        let mut remaining = price;
        let mut emoluments = 0.0;
        for tier in self.notary_tiers.iter().rev() {
            if remaining > tier.lower_bound {
                emoluments += (remaining - tier.lower_bound) * tier.rate;
                remaining = tier.lower_bound;
            }
        }

        emoluments * self.vat_factor
    }

    pub fn transfer_tax_rate(&self, category: PropertyCategory) -> f64 {
        match category {
            PropertyCategory::New => self.transfer_tax_new,
            PropertyCategory::Old => self.transfer_tax_old,
        }
    }

    pub fn security_contribution(&self, price: f64) -> f64 {
        if !price.is_finite() || price <= 0.0 {
            return 0.0;
        }
        (price * self.security_contribution_rate).max(self.security_contribution_min)
    }

    /// Total notary fees for a purchase
    pub fn notary_fees(&self, price: f64, category: PropertyCategory) -> f64 {
        if !price.is_finite() || price <= 0.0 {
            return 0.0;
        }
        self.notary_emoluments(price)
            + price * self.transfer_tax_rate(category)
            + self.disbursements
            + self.security_contribution(price)
    }

    /// Guarantee fee for a loan amount
    pub fn guarantee_fee(&self, loan_amount: f64) -> f64 {
        if !loan_amount.is_finite() || loan_amount <= 0.0 {
            return 0.0;
        }
        let g = &self.guarantee;
        let commission = if loan_amount <= g.threshold {
            loan_amount * g.base_rate
        } else {
            g.fixed_above + (loan_amount - g.threshold) * g.marginal_rate
        };
        let mutual_fund = loan_amount * g.mutual_fund_rate;

        (commission + mutual_fund).max(g.minimum)
    }

    /// Full fee breakdown for a price / loan pair
    pub fn breakdown(
        &self,
        price: f64,
        category: PropertyCategory,
        loan_amount: f64,
        dossier_fee: f64,
    ) -> FeeBreakdown {
        FeeBreakdown::new(
            self.notary_fees(price, category),
            self.guarantee_fee(loan_amount),
            dossier_fee.max(0.0),
        )
    }
}

/// Derived fee totals; `total` is always the sum of the parts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub notary_fees: f64,
    pub guarantee_fee: f64,
    pub dossier_fee: f64,
    pub total: f64,
}

impl FeeBreakdown {
    pub fn new(notary_fees: f64, guarantee_fee: f64, dossier_fee: f64) -> Self {
        Self {
            notary_fees,
            guarantee_fee,
            dossier_fee,
            total: notary_fees + guarantee_fee + dossier_fee,
        }
    }

    /// Fees charged by the lender side (included in the effective rate)
    pub fn credit_fees(&self) -> f64 {
        self.guarantee_fee + self.dossier_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_emoluments_tier_boundaries() {
        let fees = FeeSchedule::default();

        // First boundary: only tier 1
        assert_abs_diff_eq!(fees.notary_emoluments(6_500.0), 6_500.0 * 0.0387 * 1.2, epsilon = 1e-9);

        // Second boundary: tiers 1 and 2
        let at_17k = (6_500.0 * 0.0387 + 10_500.0 * 0.01596) * 1.2;
        assert_abs_diff_eq!(fees.notary_emoluments(17_000.0), at_17k, epsilon = 1e-9);

        // Third boundary: tiers 1-3, nothing from the top tier
        let at_60k = (6_500.0 * 0.0387 + 10_500.0 * 0.01596 + 43_000.0 * 0.01064) * 1.2;
        assert_abs_diff_eq!(fees.notary_emoluments(60_000.0), at_60k, epsilon = 1e-9);
        assert_abs_diff_eq!(fees.notary_emoluments(60_000.0), 1051.98, epsilon = 1e-9);

        // One euro past the boundary picks up the top rate
        assert_abs_diff_eq!(
            fees.notary_emoluments(60_001.0) - fees.notary_emoluments(60_000.0),
            0.00799 * 1.2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_notary_fees_by_category() {
        let fees = FeeSchedule::default();

        let emoluments = (876.65 + 140_000.0 * 0.00799) * 1.2;
        let old = fees.notary_fees(200_000.0, PropertyCategory::Old);
        assert_abs_diff_eq!(old, emoluments + 11_613.30 + 1_200.0 + 200.0, epsilon = 1e-6);

        let new = fees.notary_fees(200_000.0, PropertyCategory::New);
        assert_abs_diff_eq!(new, emoluments + 1_430.0 + 1_200.0 + 200.0, epsilon = 1e-6);
        assert!(new < old);
    }

    #[test]
    fn test_security_contribution_floor() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.security_contribution(5_000.0), 15.0);
        assert_abs_diff_eq!(fees.security_contribution(100_000.0), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_guarantee_fee_tiers() {
        let fees = FeeSchedule::default();

        // Below the threshold: flat commission, floored total
        assert_eq!(fees.guarantee_fee(20_000.0), 500.0);
        assert_abs_diff_eq!(fees.guarantee_fee(40_000.0), 400.0 + 320.0, epsilon = 1e-9);

        // At the threshold both formulas agree
        assert_abs_diff_eq!(fees.guarantee_fee(50_000.0), 500.0 + 400.0, epsilon = 1e-9);

        // Above: fixed + marginal
        assert_abs_diff_eq!(fees.guarantee_fee(200_000.0), 1_100.0 + 1_600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fees_zero_for_non_positive_amounts() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.notary_fees(0.0, PropertyCategory::Old), 0.0);
        assert_eq!(fees.notary_emoluments(-1.0), 0.0);
        assert_eq!(fees.guarantee_fee(0.0), 0.0);
    }

    #[test]
    fn test_fees_monotonic_in_price() {
        let fees = FeeSchedule::default();
        let mut previous = 0.0;
        for step in 1..=120 {
            let price = step as f64 * 5_000.0;
            let total = fees.notary_fees(price, PropertyCategory::Old);
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn test_breakdown_total() {
        let fees = FeeSchedule::default();
        let breakdown = fees.breakdown(250_000.0, PropertyCategory::New, 230_000.0, 1_000.0);
        assert_abs_diff_eq!(
            breakdown.total,
            breakdown.notary_fees + breakdown.guarantee_fee + breakdown.dossier_fee,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(breakdown.credit_fees(), breakdown.guarantee_fee + 1_000.0, epsilon = 1e-9);
    }
}
