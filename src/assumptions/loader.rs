//! CSV-based assumption loader
//!
//! Loads the instrument catalog and scenario tables from CSV files in data/assumptions/

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::Reader;

use super::{CapitalGrowth, ScenarioSet, ScenarioTables};
use crate::error::{ConfigError, Result, ScenarioKind};
use crate::instruments::{load_catalog, InstrumentCatalog};

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

pub const RATE_SCENARIOS_FILE: &str = "rate_scenarios.csv";
pub const FX_SCENARIOS_FILE: &str = "fx_scenarios.csv";
pub const CAPITAL_SCENARIOS_FILE: &str = "capital_scenarios.csv";

/// One year of a rate or FX scenario
#[derive(Debug, serde::Deserialize)]
struct SeriesRow {
    scenario: String,
    year: usize,
    value: f64,
}

#[derive(Debug, serde::Deserialize)]
struct CapitalRow {
    scenario: String,
    annual_rate: f64,
}

/// Load annual series (scenario,year,value) from any reader.
/// Years are 0-indexed and must be contiguous per scenario.
pub fn load_series_from_reader<R: Read>(kind: ScenarioKind, reader: R) -> Result<ScenarioSet> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows: BTreeMap<String, Vec<(usize, f64)>> = BTreeMap::new();

    for result in csv_reader.deserialize() {
        let row: SeriesRow = result?;
        rows.entry(row.scenario).or_default().push((row.year, row.value));
    }

    let mut set = ScenarioSet::new(kind);
    for (name, mut years) in rows {
        years.sort_by_key(|(year, _)| *year);
        for (expected, (year, _)) in years.iter().enumerate() {
            if *year != expected {
                return Err(ConfigError::invalid_value(
                    format!("{} scenario '{}'", kind, name),
                    format!("expected year {}, found {}", expected, year),
                ));
            }
        }
        set.insert(name, years.into_iter().map(|(_, v)| v).collect())?;
    }

    Ok(set)
}

/// Load capital-growth rates (scenario,annual_rate) from any reader
pub fn load_capital_growth_from_reader<R: Read>(
    reader: R,
) -> Result<BTreeMap<String, CapitalGrowth>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut growth = BTreeMap::new();

    for result in csv_reader.deserialize() {
        let row: CapitalRow = result?;
        if !row.annual_rate.is_finite() || row.annual_rate <= -1.0 {
            return Err(ConfigError::invalid_value(
                format!("capital-growth scenario '{}'", row.scenario),
                format!("annual rate {} must be finite and above -1", row.annual_rate),
            ));
        }
        if growth.contains_key(&row.scenario) {
            return Err(ConfigError::invalid_value(
                format!("capital-growth scenario '{}'", row.scenario),
                "listed more than once",
            ));
        }
        growth.insert(row.scenario, CapitalGrowth::new(row.annual_rate));
    }

    Ok(growth)
}

/// Load all three scenario tables from a directory
pub fn load_scenario_tables(path: &Path) -> Result<ScenarioTables> {
    Ok(ScenarioTables {
        rates: load_series_from_reader(
            ScenarioKind::Rate,
            File::open(path.join(RATE_SCENARIOS_FILE))?,
        )?,
        fx: load_series_from_reader(ScenarioKind::Fx, File::open(path.join(FX_SCENARIOS_FILE))?)?,
        capital_growth: load_capital_growth_from_reader(File::open(
            path.join(CAPITAL_SCENARIOS_FILE),
        )?)?,
    })
}

/// Everything read from an assumptions directory
pub struct LoadedAssumptions {
    pub catalog: InstrumentCatalog,
    pub scenarios: ScenarioTables,
}

impl LoadedAssumptions {
    /// Load all assumptions from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load all assumptions from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            catalog: load_catalog(path)?,
            scenarios: load_scenario_tables(path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_assumptions() {
        let result = LoadedAssumptions::load_default();
        assert!(result.is_ok(), "Failed to load assumptions: {:?}", result.err());

        let loaded = result.unwrap();
        let defaults = ScenarioTables::default_forecast();

        // Shipped CSVs mirror the in-memory forecast
        for name in ["base", "pessimistic", "optimistic"] {
            assert_eq!(
                loaded.scenarios.rates.get(name).unwrap(),
                defaults.rates.get(name).unwrap()
            );
            assert_eq!(
                loaded.scenarios.fx.get(name).unwrap(),
                defaults.fx.get(name).unwrap()
            );
        }
        assert_eq!(loaded.scenarios.capital_growth, defaults.capital_growth);
        assert_eq!(loaded.catalog.names(), InstrumentCatalog::default_catalog().names());
    }

    #[test]
    fn test_year_gap_rejected() {
        let data = "scenario,year,value\nbase,0,16.5\nbase,2,12.0\n";
        let err = load_series_from_reader(ScenarioKind::Rate, data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected year 1"));
    }

    #[test]
    fn test_rows_sorted_by_year() {
        let data = "scenario,year,value\nflat,1,82.0\nflat,0,81.0\n";
        let set = load_series_from_reader(ScenarioKind::Fx, data.as_bytes()).unwrap();
        assert_eq!(set.get("flat").unwrap().values(), &[81.0, 82.0]);
    }

    #[test]
    fn test_capital_rate_out_of_range() {
        let data = "scenario,annual_rate\nwipeout,-1.5\n";
        assert!(load_capital_growth_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_duplicate_capital_scenario_rejected() {
        let data = "scenario,annual_rate
constant,0.0
constant,0.05
";
        let err = load_capital_growth_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("more than once"));
    }
}
