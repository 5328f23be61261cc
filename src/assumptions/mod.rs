//! Allocation assumptions: the instrument catalog and macro scenario tables

mod scenarios;
pub mod loader;

pub use scenarios::{
    CapitalGrowth, ResolvedScenario, ScenarioKey, ScenarioSeries, ScenarioSet, ScenarioTables,
    BASE_SCENARIO, CONSTANT_CAPITAL,
};
pub use loader::{LoadedAssumptions, DEFAULT_ASSUMPTIONS_PATH};

use std::path::Path;

use crate::error::Result;
use crate::instruments::InstrumentCatalog;

/// Container for all allocation assumptions.
///
/// Built once and shared by reference; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub catalog: InstrumentCatalog,
    pub scenarios: ScenarioTables,
}

impl Assumptions {
    pub fn new(catalog: InstrumentCatalog, scenarios: ScenarioTables) -> Self {
        Self { catalog, scenarios }
    }

    /// Default catalog and forecast scenarios
    pub fn default_forecast() -> Self {
        Self {
            catalog: InstrumentCatalog::default_catalog(),
            scenarios: ScenarioTables::default_forecast(),
        }
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let loaded = LoadedAssumptions::load_from(path)?;
        Ok(Self::new(loaded.catalog, loaded.scenarios))
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_forecast()
    }
}
