//! Named macro scenarios: central-rate paths, FX paths and capital-growth rates
//!
//! Rate and FX scenarios are annual series indexed by year. Lookups past the end
//! of a series return its last value, so a 3-year table can drive a 10-year run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, ScenarioKind};

/// Name of the reference scenario in each table
pub const BASE_SCENARIO: &str = "base";

/// Name of the flat capital-growth scenario
pub const CONSTANT_CAPITAL: &str = "constant";

/// Non-empty annual series of a scenario variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSeries(Vec<f64>);

impl ScenarioSeries {
    /// Wrap a series; None if it has no values
    pub fn new(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            None
        } else {
            Some(Self(values))
        }
    }

    /// Value for a 0-indexed year, clamped to the last entry
    pub fn at(&self, index: usize) -> f64 {
        let last = self.0.len() - 1;
        self.0[index.min(last)]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: empty series cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

/// Named series of one scenario kind (rates or FX)
#[derive(Debug, Clone)]
pub struct ScenarioSet {
    kind: ScenarioKind,
    series: BTreeMap<String, ScenarioSeries>,
}

impl ScenarioSet {
    pub fn new(kind: ScenarioKind) -> Self {
        Self {
            kind,
            series: BTreeMap::new(),
        }
    }

    /// Build a set from (name, values) pairs
    pub fn from_pairs<N, I>(kind: ScenarioKind, pairs: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<f64>)>,
    {
        let mut set = Self::new(kind);
        for (name, values) in pairs {
            set.insert(name, values)?;
        }
        Ok(set)
    }

    /// Add or replace a named series.
    /// Values must be finite; FX rates must also be strictly positive.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();

        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::invalid_value(
                format!("{} scenario '{}'", self.kind, name),
                format!("non-finite value {}", bad),
            ));
        }
        if self.kind == ScenarioKind::Fx {
            if let Some(bad) = values.iter().find(|v| **v <= 0.0) {
                return Err(ConfigError::invalid_value(
                    format!("{} scenario '{}'", self.kind, name),
                    format!("exchange rate must be positive, found {}", bad),
                ));
            }
        }

        let series = ScenarioSeries::new(values).ok_or_else(|| ConfigError::EmptyScenario {
            kind: self.kind,
            name: name.clone(),
        })?;
        self.series.insert(name, series);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ScenarioSeries> {
        self.series
            .get(name)
            .ok_or_else(|| ConfigError::unknown_scenario(self.kind, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Annual capital-growth assumption (fraction per year, e.g. -0.05)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalGrowth {
    pub annual_rate: f64,
}

impl CapitalGrowth {
    pub fn new(annual_rate: f64) -> Self {
        Self { annual_rate }
    }

    /// Negative growth is an intentional drawdown, not a loss to be penalized
    pub fn is_planned_decline(&self) -> bool {
        self.annual_rate < 0.0
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0
    }
}

/// Selection of one capital-growth, rate and FX scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub capital: String,
    pub rate: String,
    pub fx: String,
}

impl ScenarioKey {
    pub fn new(capital: impl Into<String>, rate: impl Into<String>, fx: impl Into<String>) -> Self {
        Self {
            capital: capital.into(),
            rate: rate.into(),
            fx: fx.into(),
        }
    }

    /// Constant capital with base rate and FX paths
    pub fn base() -> Self {
        Self::new(CONSTANT_CAPITAL, BASE_SCENARIO, BASE_SCENARIO)
    }
}

impl Default for ScenarioKey {
    fn default() -> Self {
        Self::base()
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.capital, self.rate, self.fx)
    }
}

/// Scenario key resolved against the tables
#[derive(Debug, Clone, Copy)]
pub struct ResolvedScenario<'a> {
    pub rates: &'a ScenarioSeries,
    pub fx: &'a ScenarioSeries,
    pub capital_growth: CapitalGrowth,
}

/// All scenario tables
#[derive(Debug, Clone)]
pub struct ScenarioTables {
    pub rates: ScenarioSet,
    pub fx: ScenarioSet,
    pub capital_growth: BTreeMap<String, CapitalGrowth>,
}

impl ScenarioTables {
    /// Forecast tables shipped with the application.
    /// Rates in % per year, FX in domestic units per foreign unit, years 0..=5.
    pub fn default_forecast() -> Self {
        let rate_table = [
            (BASE_SCENARIO, vec![16.5, 16.0, 12.0, 10.0, 10.0, 10.0]),
            ("pessimistic", vec![16.5, 17.0, 15.0, 14.0, 13.0, 12.0]),
            ("optimistic", vec![16.5, 14.0, 11.0, 9.0, 8.0, 7.5]),
        ];
        let fx_table = [
            (BASE_SCENARIO, vec![81.17, 83.0, 92.0, 95.0, 98.0, 100.0]),
            ("pessimistic", vec![81.17, 88.0, 100.0, 110.0, 118.0, 125.0]),
            ("optimistic", vec![81.17, 80.0, 78.0, 76.0, 75.0, 74.0]),
        ];
        let capital_table = [
            (CONSTANT_CAPITAL, 0.0),
            ("decrease_5", -0.05),
            ("decrease_10", -0.10),
            ("increase_5", 0.05),
            ("increase_10", 0.10),
        ];

        let mut rates = ScenarioSet::new(ScenarioKind::Rate);
        for (name, values) in rate_table {
            rates.series.insert(name.to_string(), ScenarioSeries(values));
        }
        let mut fx = ScenarioSet::new(ScenarioKind::Fx);
        for (name, values) in fx_table {
            fx.series.insert(name.to_string(), ScenarioSeries(values));
        }

        Self {
            rates,
            fx,
            capital_growth: capital_table
                .into_iter()
                .map(|(name, rate)| (name.to_string(), CapitalGrowth::new(rate)))
                .collect(),
        }
    }

    pub fn capital_growth(&self, name: &str) -> Result<CapitalGrowth> {
        self.capital_growth
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::unknown_scenario(ScenarioKind::CapitalGrowth, name))
    }

    /// Look up all three parts of a scenario key
    pub fn resolve(&self, key: &ScenarioKey) -> Result<ResolvedScenario<'_>> {
        Ok(ResolvedScenario {
            rates: self.rates.get(&key.rate)?,
            fx: self.fx.get(&key.fx)?,
            capital_growth: self.capital_growth(&key.capital)?,
        })
    }
}

impl Default for ScenarioTables {
    fn default() -> Self {
        Self::default_forecast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_clamps_past_end() {
        let tables = ScenarioTables::default_forecast();
        let base = tables.rates.get(BASE_SCENARIO).unwrap();

        assert_eq!(base.at(0), 16.5);
        assert_eq!(base.at(5), 10.0);
        assert_eq!(base.at(6), 10.0);
        assert_eq!(base.at(100), 10.0);
    }

    #[test]
    fn test_resolve_default_key() {
        let tables = ScenarioTables::default_forecast();
        let resolved = tables.resolve(&ScenarioKey::base()).unwrap();

        assert_eq!(resolved.fx.at(0), 81.17);
        assert_eq!(resolved.capital_growth.annual_rate, 0.0);
        assert!(!resolved.capital_growth.is_planned_decline());
    }

    #[test]
    fn test_unknown_scenario() {
        let tables = ScenarioTables::default_forecast();
        let key = ScenarioKey::new(CONSTANT_CAPITAL, "stagflation", BASE_SCENARIO);

        let err = tables.resolve(&key).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownScenario { kind: ScenarioKind::Rate, .. }
        ));
    }

    #[test]
    fn test_planned_decline() {
        let tables = ScenarioTables::default_forecast();
        assert!(tables.capital_growth("decrease_5").unwrap().is_planned_decline());
        assert!(!tables.capital_growth("increase_10").unwrap().is_planned_decline());
    }

    #[test]
    fn test_insert_validation() {
        let mut fx = ScenarioSet::new(ScenarioKind::Fx);
        assert!(matches!(
            fx.insert("empty", vec![]),
            Err(ConfigError::EmptyScenario { .. })
        ));
        assert!(fx.insert("negative", vec![80.0, -1.0]).is_err());
        assert!(fx.insert("nan", vec![f64::NAN]).is_err());
        assert!(fx.insert("ok", vec![80.0]).is_ok());
        assert_eq!(fx.len(), 1);
    }
}
