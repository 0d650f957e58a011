//! CSV-based assumption loader
//!
//! Loads rate, insurance and fee assumptions from CSV files in data/assumptions/

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use super::fees::NotaryTier;
use super::insurance::InsuranceBracket;
use crate::error::{MortgageError, MortgageResult};

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

fn open_reader(path: &Path, file_name: &str) -> MortgageResult<csv::Reader<File>> {
    let file = File::open(path.join(file_name))?;
    Ok(csv::Reader::from_reader(file))
}

fn parse_field<T: std::str::FromStr>(value: &str, context: &str) -> MortgageResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| MortgageError::parse(context, format!("'{}': {}", value, e)))
}

/// Load the nominal rate grid
/// Returns Vec<(duration_years, annual_rate_percent)>
pub fn load_rate_table(path: &Path) -> MortgageResult<Vec<(u32, f64)>> {
    let mut reader = open_reader(path, "rate_table.csv")?;
    let mut rates = Vec::new();

    for result in reader.records() {
        let record = result?;
        let duration: u32 = parse_field(&record[0], "rate_table.csv duration")?;
        let rate: f64 = parse_field(&record[1], "rate_table.csv rate")?;
        rates.push((duration, rate));
    }

    Ok(rates)
}

/// Load insurance age brackets
/// An empty max_age column marks the open-ended top bracket
pub fn load_insurance_brackets(path: &Path) -> MortgageResult<Vec<InsuranceBracket>> {
    let mut reader = open_reader(path, "insurance_brackets.csv")?;
    let mut brackets = Vec::new();

    for result in reader.records() {
        let record = result?;
        let max_age = match record[0].trim() {
            "" => None,
            raw => Some(parse_field::<u32>(raw, "insurance_brackets.csv max_age")?),
        };
        let annual_rate: f64 = parse_field(&record[1], "insurance_brackets.csv annual_rate")?;
        brackets.push(InsuranceBracket { max_age, annual_rate });
    }

    Ok(brackets)
}

/// Load the émoluments scale
pub fn load_notary_tiers(path: &Path) -> MortgageResult<Vec<NotaryTier>> {
    let mut reader = open_reader(path, "notary_tiers.csv")?;
    let mut tiers = Vec::new();

    for result in reader.records() {
        let record = result?;
        let lower_bound: f64 = parse_field(&record[0], "notary_tiers.csv lower_bound")?;
        let rate: f64 = parse_field(&record[1], "notary_tiers.csv rate")?;
        tiers.push(NotaryTier { lower_bound, rate });
    }

    Ok(tiers)
}

/// Load scalar parameters as a key -> value map
pub fn load_parameters(path: &Path) -> MortgageResult<HashMap<String, f64>> {
    let mut reader = open_reader(path, "parameters.csv")?;
    let mut params = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let key = record[0].trim().to_string();
        let value: f64 = parse_field(&record[1], &format!("parameters.csv {}", key))?;
        params.insert(key, value);
    }

    Ok(params)
}

/// All assumption tables loaded from a directory
#[derive(Debug, Clone)]
pub struct LoadedAssumptions {
    pub rate_table: Vec<(u32, f64)>,
    pub insurance_brackets: Vec<InsuranceBracket>,
    pub notary_tiers: Vec<NotaryTier>,
    pub parameters: HashMap<String, f64>,
}

impl LoadedAssumptions {
    /// Load from the default location
    pub fn load() -> MortgageResult<Self> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load from a specific directory
    pub fn load_from(path: &Path) -> MortgageResult<Self> {
        log::debug!("Loading assumptions from {}", path.display());
        Ok(Self {
            rate_table: load_rate_table(path)?,
            insurance_brackets: load_insurance_brackets(path)?,
            notary_tiers: load_notary_tiers(path)?,
            parameters: load_parameters(path)?,
        })
    }

    /// Look up a scalar parameter
    pub fn parameter(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_ASSUMPTIONS_PATH)
    }

    #[test]
    fn test_load_checked_in_assumptions() {
        let loaded = LoadedAssumptions::load_from(&data_dir()).unwrap();

        assert_eq!(loaded.rate_table.len(), 3);
        assert_eq!(loaded.insurance_brackets.len(), 5);
        assert!(loaded.insurance_brackets.last().unwrap().max_age.is_none());
        assert_eq!(loaded.notary_tiers.len(), 4);
        assert_eq!(loaded.parameter("vat_factor"), Some(1.2));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let err = LoadedAssumptions::load_from(Path::new("/nonexistent/assumptions")).unwrap_err();
        assert!(matches!(err, MortgageError::Io(_)));
    }
}
