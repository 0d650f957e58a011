//! Borrower data structures and input loading

mod data;
pub mod loader;

pub use data::{
    monthly_total, BudgetItem, CalculationInput, ExpenseItem, GigogneConfig, IncomeItem, Recurrence,
};
pub use loader::{load_budget_items, load_budget_items_from_reader, load_input, BudgetItems};
