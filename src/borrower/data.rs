//! Borrower input snapshot: budget items, purchase parameters and gigogne options

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::annuity::MAX_DURATION_YEARS;
use crate::assumptions::{PropertyCategory, RateTable};
use crate::error::{MortgageError, MortgageResult};

/// How often a budget amount recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    Monthly,
    Yearly,
}

/// An income or expense line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    /// Identifier owned by the editing UI; ignored by the calculation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub recurrence: Recurrence,
}

pub type IncomeItem = BudgetItem;
pub type ExpenseItem = BudgetItem;

impl BudgetItem {
    pub fn monthly(amount: f64) -> Self {
        Self { id: None, amount, recurrence: Recurrence::Monthly }
    }

    pub fn yearly(amount: f64) -> Self {
        Self { id: None, amount, recurrence: Recurrence::Yearly }
    }

    /// Amount normalized to one month
    pub fn monthly_amount(&self) -> f64 {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return 0.0;
        }
        match self.recurrence {
            Recurrence::Monthly => self.amount,
            Recurrence::Yearly => self.amount / 12.0,
        }
    }
}

/// Sum of a collection of budget items, per month
pub fn monthly_total(items: &[BudgetItem]) -> f64 {
    items.iter().map(BudgetItem::monthly_amount).sum()
}

/// Optional secondary tranche for gigogne smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GigogneConfig {
    #[serde(default)]
    pub enabled: bool,
    pub secondary_rate_percent: f64,
    pub secondary_duration_years: u32,
    /// Upper bound the borrower accepts for the secondary tranche
    pub max_secondary_amount: f64,
}

/// Complete, immutable input to one recalculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    #[serde(default)]
    pub incomes: Vec<IncomeItem>,
    #[serde(default)]
    pub expenses: Vec<ExpenseItem>,
    /// Rate grid; an empty grid falls back to the assumption defaults
    #[serde(default)]
    pub rates: RateTable,
    /// Borrower age, used only for the insurance bracket
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub capital: f64,
    pub duration_years: u32,
    #[serde(default)]
    pub dossier_fee: f64,
    #[serde(default)]
    pub property_category: PropertyCategory,
    /// Price to finance; the affordable maximum is used when absent
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub gigogne: Option<GigogneConfig>,
    #[serde(default)]
    pub first_payment_date: Option<NaiveDate>,
}

fn check_amount(field: &str, value: f64) -> MortgageResult<()> {
    if !value.is_finite() {
        return Err(MortgageError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(MortgageError::invalid(field, format!("must not be negative (got {})", value)));
    }
    Ok(())
}

impl CalculationInput {
    /// Minimal input for a duration; everything else defaults to zero/absent
    pub fn new(duration_years: u32) -> Self {
        Self {
            incomes: Vec::new(),
            expenses: Vec::new(),
            rates: RateTable::default(),
            age: None,
            capital: 0.0,
            duration_years,
            dossier_fee: 0.0,
            property_category: PropertyCategory::default(),
            target_price: None,
            gigogne: None,
            first_payment_date: None,
        }
    }

    pub fn monthly_income(&self) -> f64 {
        monthly_total(&self.incomes)
    }

    pub fn monthly_charges(&self) -> f64 {
        monthly_total(&self.expenses)
    }

    /// Gigogne options, only when enabled
    pub fn active_gigogne(&self) -> Option<&GigogneConfig> {
        self.gigogne.as_ref().filter(|g| g.enabled)
    }

    /// Reject negative, non-finite or inconsistent values
    ///
    /// Absent optional values (no age, no target price, no gigogne) are valid
    /// and degrade to zero inside the formulas.
    pub fn validate(&self) -> MortgageResult<()> {
        for (i, item) in self.incomes.iter().enumerate() {
            check_amount(&format!("incomes[{}].amount", i), item.amount)?;
        }
        for (i, item) in self.expenses.iter().enumerate() {
            check_amount(&format!("expenses[{}].amount", i), item.amount)?;
        }
        for (duration, rate) in self.rates.anchors() {
            check_amount(&format!("rates[{}]", duration), rate)?;
        }

        check_amount("capital", self.capital)?;
        check_amount("dossier_fee", self.dossier_fee)?;
        if let Some(price) = self.target_price {
            check_amount("target_price", price)?;
        }

        if self.duration_years == 0 {
            return Err(MortgageError::invalid("duration_years", "must be at least one year"));
        }
        if self.duration_years > MAX_DURATION_YEARS {
            return Err(MortgageError::invalid(
                "duration_years",
                format!(
                    "{} years exceeds the maximum of {} years",
                    self.duration_years, MAX_DURATION_YEARS
                ),
            ));
        }

        if let Some(g) = self.active_gigogne() {
            check_amount("gigogne.secondary_rate_percent", g.secondary_rate_percent)?;
            check_amount("gigogne.max_secondary_amount", g.max_secondary_amount)?;
            if g.secondary_duration_years == 0 {
                return Err(MortgageError::invalid(
                    "gigogne.secondary_duration_years",
                    "must be at least one year",
                ));
            }
            if g.secondary_duration_years > self.duration_years {
                return Err(MortgageError::invalid(
                    "gigogne.secondary_duration_years",
                    format!(
                        "{} years exceeds the primary duration of {} years",
                        g.secondary_duration_years, self.duration_years
                    ),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn valid_input() -> CalculationInput {
        let mut input = CalculationInput::new(20);
        input.incomes = vec![BudgetItem::monthly(3_000.0), BudgetItem::yearly(6_000.0)];
        input.expenses = vec![BudgetItem::monthly(150.0)];
        input.capital = 20_000.0;
        input
    }

    #[test]
    fn test_monthly_totals() {
        let input = valid_input();
        assert_abs_diff_eq!(input.monthly_income(), 3_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(input.monthly_charges(), 150.0, epsilon = 1e-9);
        assert_eq!(monthly_total(&[]), 0.0);
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut input = valid_input();
        input.expenses.push(BudgetItem::monthly(-10.0));
        let err = input.validate().unwrap_err();
        assert!(matches!(
            err,
            MortgageError::InvalidInput { ref field, .. } if field == "expenses[1].amount"
        ));

        let mut input = valid_input();
        input.capital = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut input = valid_input();
        input.duration_years = 0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_excessive_duration_rejected() {
        let mut input = valid_input();
        input.duration_years = 400_000_000;
        let err = input.validate().unwrap_err();
        assert!(matches!(
            err,
            MortgageError::InvalidInput { ref field, .. } if field == "duration_years"
        ));

        input.duration_years = MAX_DURATION_YEARS;
        assert!(input.validate().is_ok());
        input.duration_years = MAX_DURATION_YEARS + 1;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_secondary_longer_than_primary_rejected() {
        let mut input = valid_input();
        input.gigogne = Some(GigogneConfig {
            enabled: true,
            secondary_rate_percent: 1.0,
            secondary_duration_years: 25,
            max_secondary_amount: 40_000.0,
        });
        assert!(input.validate().is_err());

        // Disabled options are not checked
        input.gigogne.as_mut().unwrap().enabled = false;
        assert!(input.validate().is_ok());
        assert!(input.active_gigogne().is_none());
    }

    #[test]
    fn test_omitted_fields_take_defaults() {
        let input: CalculationInput = serde_json::from_str(
            r#"{"incomes": [{"amount": 2500}], "duration_years": 20}"#,
        )
        .unwrap();

        assert_eq!(input.incomes[0].recurrence, Recurrence::Monthly);
        assert_eq!(input.property_category, PropertyCategory::Old);
        assert_eq!(CalculationInput::new(20).property_category, PropertyCategory::Old);
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let input: CalculationInput = serde_json::from_str(
            r#"{
                "incomes": [{"id": "salary", "amount": 4000, "recurrence": "monthly"}],
                "expenses": [{"amount": 1200, "recurrence": "yearly"}],
                "duration_years": 25,
                "property_category": "new",
                "first_payment_date": "2026-11-05"
            }"#,
        )
        .unwrap();

        assert_eq!(input.incomes[0].id.as_deref(), Some("salary"));
        assert_abs_diff_eq!(input.monthly_charges(), 100.0, epsilon = 1e-9);
        assert_eq!(input.property_category, PropertyCategory::New);
        assert!(input.rates.is_empty());
        assert_eq!(input.first_payment_date, NaiveDate::from_ymd_opt(2026, 11, 5));
    }
}
