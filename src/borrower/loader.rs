//! Load input snapshots (JSON) and budget items (CSV)

use csv::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{BudgetItem, CalculationInput, Recurrence};
use crate::error::{MortgageError, MortgageResult};

/// Raw CSV row: kind,amount,recurrence[,id]
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    kind: String,
    amount: f64,
    recurrence: String,
    #[serde(default)]
    id: Option<String>,
}

impl CsvRow {
    fn into_item(self) -> MortgageResult<(bool, BudgetItem)> {
        let is_income = match self.kind.trim().to_ascii_lowercase().as_str() {
            "income" => true,
            "expense" => false,
            other => {
                return Err(MortgageError::parse("budget kind", format!("unknown kind '{}'", other)))
            }
        };

        let recurrence = match self.recurrence.trim().to_ascii_lowercase().as_str() {
            "monthly" => Recurrence::Monthly,
            "yearly" => Recurrence::Yearly,
            other => {
                let reason = format!("unknown recurrence '{}'", other);
                return Err(MortgageError::parse("budget recurrence", reason));
            }
        };

        let id = self.id.filter(|s| !s.trim().is_empty());
        Ok((is_income, BudgetItem { id, amount: self.amount, recurrence }))
    }
}

/// Budget items split into incomes and expenses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetItems {
    pub incomes: Vec<BudgetItem>,
    pub expenses: Vec<BudgetItem>,
}

/// Load budget items from any reader producing CSV
pub fn load_budget_items_from_reader<R: Read>(reader: R) -> MortgageResult<BudgetItems> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut items = BudgetItems::default();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        let (is_income, item) = row.into_item()?;
        if is_income {
            items.incomes.push(item);
        } else {
            items.expenses.push(item);
        }
    }

    Ok(items)
}

/// Load budget items from a CSV file
pub fn load_budget_items(path: &Path) -> MortgageResult<BudgetItems> {
    let file = File::open(path)?;
    load_budget_items_from_reader(file)
}

/// Load and validate an input snapshot from a JSON file
pub fn load_input(path: &Path) -> MortgageResult<CalculationInput> {
    let file = File::open(path)?;
    let input: CalculationInput = serde_json::from_reader(file)?;
    input.validate()?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_load_budget_items() {
        let data = "kind,amount,recurrence,id\n\
                    income,3200,monthly,salary\n\
                    income,2400,yearly,\n\
                    expense,350,monthly,car\n";
        let items = load_budget_items_from_reader(data.as_bytes()).unwrap();

        assert_eq!(items.incomes.len(), 2);
        assert_eq!(items.expenses.len(), 1);
        assert_eq!(items.incomes[0].id.as_deref(), Some("salary"));
        assert_eq!(items.incomes[1].id, None);
        assert_abs_diff_eq!(crate::borrower::monthly_total(&items.incomes), 3_400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let data = "kind,amount,recurrence\nbonus,100,monthly\n";
        let err = load_budget_items_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, MortgageError::Parse { .. }));
    }

    #[test]
    fn test_bad_amount_is_csv_error() {
        let data = "kind,amount,recurrence\nincome,lots,monthly\n";
        let err = load_budget_items_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, MortgageError::Csv(_)));
    }
}
