//! Pricing assumptions: rate grid, insurance brackets, fee schedules and solver settings

mod fees;
mod insurance;
mod rates;
pub mod loader;

pub use fees::{FeeBreakdown, FeeSchedule, GuaranteeSchedule, NotaryTier, PropertyCategory};
pub use insurance::{monthly_insurance, InsuranceBracket, InsuranceSchedule};
pub use loader::LoadedAssumptions;
pub use rates::RateTable;

use crate::error::MortgageResult;
use crate::solver::SolverSettings;
use std::path::Path;

/// Container for all calculation assumptions
#[derive(Debug, Clone, PartialEq)]
pub struct Assumptions {
    /// Fallback rate grid when an input snapshot carries none
    pub rates: RateTable,
    pub insurance: InsuranceSchedule,
    pub fees: FeeSchedule,
    pub solver: SolverSettings,
}

impl Assumptions {
    /// Built-in market defaults
    pub fn default_pricing() -> Self {
        Self {
            rates: RateTable::default_market(),
            insurance: InsuranceSchedule::default_brackets(),
            fees: FeeSchedule::default(),
            solver: SolverSettings::default(),
        }
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> MortgageResult<Self> {
        let loaded = LoadedAssumptions::load()?;
        Ok(Self::from_loaded(&loaded))
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> MortgageResult<Self> {
        let loaded = LoadedAssumptions::load_from(path)?;
        Ok(Self::from_loaded(&loaded))
    }

    /// Overlay loaded tables on the defaults; parameters absent from the files keep their default
    pub fn from_loaded(loaded: &LoadedAssumptions) -> Self {
        let mut assumptions = Self::default_pricing();

        if !loaded.rate_table.is_empty() {
            assumptions.rates = RateTable::from_pairs(&loaded.rate_table);
        }
        if !loaded.insurance_brackets.is_empty() {
            assumptions.insurance = InsuranceSchedule::new(loaded.insurance_brackets.clone());
        }
        if !loaded.notary_tiers.is_empty() {
            assumptions.fees = assumptions.fees.with_notary_tiers(loaded.notary_tiers.clone());
        }

        for (key, &value) in &loaded.parameters {
            let fees = &mut assumptions.fees;
            match key.as_str() {
                "vat_factor" => fees.vat_factor = value,
                "transfer_tax_new" => fees.transfer_tax_new = value,
                "transfer_tax_old" => fees.transfer_tax_old = value,
                "disbursements" => fees.disbursements = value,
                "security_contribution_rate" => fees.security_contribution_rate = value,
                "security_contribution_min" => fees.security_contribution_min = value,
                "guarantee_threshold" => fees.guarantee.threshold = value,
                "guarantee_base_rate" => fees.guarantee.base_rate = value,
                "guarantee_fixed_above" => fees.guarantee.fixed_above = value,
                "guarantee_marginal_rate" => fees.guarantee.marginal_rate = value,
                "guarantee_mutual_fund_rate" => fees.guarantee.mutual_fund_rate = value,
                "guarantee_minimum" => fees.guarantee.minimum = value,
                "max_debt_ratio" => assumptions.solver.max_debt_ratio = value,
                other => log::warn!("Ignoring unknown assumption parameter '{}'", other),
            }
        }

        assumptions
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_pricing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_in_csv_matches_defaults() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(loader::DEFAULT_ASSUMPTIONS_PATH);
        let from_csv = Assumptions::from_csv_path(&dir).unwrap();
        assert_eq!(from_csv, Assumptions::default_pricing());
    }
}
