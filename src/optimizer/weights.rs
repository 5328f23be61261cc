//! Portfolio weights keyed by instrument name

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{ConfigError, Result};
use crate::instruments::InstrumentCatalog;

/// Tolerance for the fully-invested constraint
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Instrument name -> fraction of capital, in catalog order.
///
/// Owned outright: cloning gives an independent snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMapping {
    entries: Vec<(String, f64)>,
}

impl WeightMapping {
    /// Weights aligned with catalog order
    pub fn from_vector(catalog: &InstrumentCatalog, weights: &[f64]) -> Self {
        debug_assert_eq!(catalog.len(), weights.len());
        Self {
            entries: catalog
                .iter()
                .zip(weights)
                .map(|(instrument, &w)| (instrument.name.clone(), w))
                .collect(),
        }
    }

    /// Named weights; instruments not mentioned get zero
    pub fn from_pairs<'a, I>(catalog: &InstrumentCatalog, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut weights = vec![0.0; catalog.len()];
        for (name, weight) in pairs {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid_value(
                    format!("weight of {}", name),
                    format!("must be finite and non-negative, got {}", weight),
                ));
            }
            weights[catalog.index_of(name)?] = weight;
        }
        Ok(Self::from_vector(catalog, &weights))
    }

    /// Equal weight in every instrument
    pub fn uniform(catalog: &InstrumentCatalog) -> Self {
        let n = catalog.len();
        Self::from_vector(catalog, &vec![1.0 / n as f64; n])
    }

    /// Weights in catalog order; names outside the catalog are an error
    pub fn to_vector(&self, catalog: &InstrumentCatalog) -> Result<Vec<f64>> {
        let mut weights = vec![0.0; catalog.len()];
        for (name, weight) in &self.entries {
            weights[catalog.index_of(name)?] = *weight;
        }
        Ok(weights)
    }

    /// Weight of an instrument, zero if absent
    pub fn weight(&self, name: &str) -> f64 {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0.0, |(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, w)| (n.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Sum of absolute weight changes needed to move to `target`
    pub fn turnover(&self, target: &WeightMapping) -> f64 {
        let mut moved: f64 = self
            .entries
            .iter()
            .map(|(name, w)| (target.weight(name) - w).abs())
            .sum();
        // Instruments only present in the target
        moved += target
            .entries
            .iter()
            .filter(|(name, _)| !self.entries.iter().any(|(n, _)| n == name))
            .map(|(_, w)| w.abs())
            .sum::<f64>();
        moved
    }

    /// Fully invested, non-negative and within every category bound
    pub fn is_feasible(&self, catalog: &InstrumentCatalog) -> bool {
        if (self.total() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return false;
        }
        self.entries.iter().all(|(name, w)| match catalog.get(name) {
            Ok(instrument) => {
                *w >= -WEIGHT_SUM_TOLERANCE && *w <= instrument.max_weight() + WEIGHT_SUM_TOLERANCE
            }
            Err(_) => false,
        })
    }
}

impl Serialize for WeightMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, weight) in &self.entries {
            map.serialize_entry(name, weight)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_weights() {
        let catalog = InstrumentCatalog::default_catalog();
        let weights = WeightMapping::uniform(&catalog);

        assert_eq!(weights.len(), 4);
        assert_relative_eq!(weights.total(), 1.0);
        assert_relative_eq!(weights.weight("Foreign Cash"), 0.25);
        // 0.25 exceeds the structured cap of 0.20
        assert!(!weights.is_feasible(&catalog));
    }

    #[test]
    fn test_from_pairs_and_feasibility() {
        let catalog = InstrumentCatalog::default_catalog();
        let weights = WeightMapping::from_pairs(
            &catalog,
            [
                ("Bank Deposit CR-0.5", 0.4),
                ("Money Market Fund", 0.3),
                ("Structured Note", 0.2),
                ("Foreign Cash", 0.1),
            ],
        )
        .unwrap();
        assert!(weights.is_feasible(&catalog));
        assert_eq!(weights.to_vector(&catalog).unwrap(), vec![0.4, 0.3, 0.2, 0.1]);

        assert!(WeightMapping::from_pairs(&catalog, [("Gold", 1.0)]).is_err());
        assert!(WeightMapping::from_pairs(&catalog, [("Foreign Cash", -0.1)]).is_err());
    }

    #[test]
    fn test_turnover() {
        let catalog = InstrumentCatalog::default_catalog();
        let a = WeightMapping::from_vector(&catalog, &[0.5, 0.3, 0.2, 0.0]);
        let b = WeightMapping::from_vector(&catalog, &[0.3, 0.5, 0.0, 0.2]);

        assert_relative_eq!(a.turnover(&b), 0.8, epsilon = 1e-12);
        assert_eq!(a.turnover(&a), 0.0);
    }

    #[test]
    fn test_serializes_in_catalog_order() {
        let catalog = InstrumentCatalog::default_catalog();
        let weights = WeightMapping::from_vector(&catalog, &[0.5, 0.3, 0.2, 0.0]);
        let json = serde_json::to_string(&weights).unwrap();
        assert!(json.starts_with(r#"{"Bank Deposit CR-0.5":0.5"#));
    }
}
