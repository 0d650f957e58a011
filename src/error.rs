//! Error type for input validation and assumption loading
//!
//! The calculation formulas never fail: they degrade to zero on missing or
//! non-positive inputs. Errors only surface at the boundary, when an input
//! snapshot or an assumption file is rejected.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No interest rate available for a {duration_years}-year loan")]
    RateUnavailable { duration_years: u32 },

    #[error("Parse error in {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MortgageError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MortgageError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        MortgageError::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

pub type MortgageResult<T> = Result<T, MortgageError>;
