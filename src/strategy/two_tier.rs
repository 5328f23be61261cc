//! Two-tier strategy: a fixed holding plus a dynamic pair
//!
//! The fixed tier keeps a constant weight in one instrument for the whole horizon.
//! The remaining capital is split between two instruments each month, leaning
//! towards whichever has the higher expected monthly yield.

use serde::{Deserialize, Serialize};

use super::{AllocationStrategy, PeriodContext};
use crate::error::{ConfigError, Result};
use crate::instruments::InstrumentCatalog;
use crate::optimizer::{AllocationResult, SolveStatus, WeightMapping};
use crate::projection::YieldModel;

/// Tier composition and split heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoTierPolicy {
    /// Instrument held at a constant weight
    pub fixed_instrument: String,

    /// Weight of the fixed tier
    pub fixed_share: f64,

    pub primary: String,

    pub secondary: String,

    /// Primary's fraction of the dynamic tier when the primary yields more
    pub primary_dominant_share: f64,

    /// Primary's fraction of the dynamic tier when the secondary yields at least as much
    pub secondary_dominant_share: f64,
}

impl Default for TwoTierPolicy {
    fn default() -> Self {
        Self {
            fixed_instrument: "Bank Deposit CR-0.5".to_string(),
            fixed_share: 0.30,
            primary: "Money Market Fund".to_string(),
            secondary: "Foreign Cash".to_string(),
            primary_dominant_share: 0.9,
            secondary_dominant_share: 0.5,
        }
    }
}

/// Two-tier strategy bound to a catalog
#[derive(Debug, Clone)]
pub struct TwoTierStrategy<'a> {
    catalog: &'a InstrumentCatalog,
    model: YieldModel,
    policy: TwoTierPolicy,
    fixed: usize,
    primary: usize,
    secondary: usize,
}

impl<'a> TwoTierStrategy<'a> {
    /// Resolve the policy's instruments and check the tiers fit within their caps
    pub fn new(catalog: &'a InstrumentCatalog, model: YieldModel, policy: TwoTierPolicy) -> Result<Self> {
        let fixed = catalog.index_of(&policy.fixed_instrument)?;
        let primary = catalog.index_of(&policy.primary)?;
        let secondary = catalog.index_of(&policy.secondary)?;

        if fixed == primary || fixed == secondary || primary == secondary {
            return Err(ConfigError::invalid_config(
                "two-tier instruments must be distinct",
            ));
        }

        for (field, share) in [
            ("primary_dominant_share", policy.primary_dominant_share),
            ("secondary_dominant_share", policy.secondary_dominant_share),
        ] {
            if !(0.0..=1.0).contains(&share) {
                return Err(ConfigError::invalid_value(field, "must be in [0, 1]"));
            }
        }

        let caps = catalog.upper_bounds();
        if !(0.0..=caps[fixed]).contains(&policy.fixed_share) {
            return Err(ConfigError::invalid_value(
                "fixed_share",
                format!("must be in [0, {}]", caps[fixed]),
            ));
        }

        let capacity = policy.fixed_share + caps[primary] + caps[secondary];
        if capacity < 1.0 - 1e-9 {
            return Err(ConfigError::InfeasibleBounds { capacity });
        }

        Ok(Self {
            catalog,
            model,
            policy,
            fixed,
            primary,
            secondary,
        })
    }

    pub fn policy(&self) -> &TwoTierPolicy {
        &self.policy
    }

    /// Weights of the primary and secondary instruments, capped by their bounds
    fn dynamic_split(&self, primary_fraction: f64) -> (f64, f64) {
        let caps = (
            self.catalog.instruments()[self.primary].max_weight(),
            self.catalog.instruments()[self.secondary].max_weight(),
        );
        let dynamic = 1.0 - self.policy.fixed_share;

        let mut primary = dynamic * primary_fraction;
        let mut secondary = dynamic - primary;
        if primary > caps.0 {
            secondary += primary - caps.0;
            primary = caps.0;
        }
        if secondary > caps.1 {
            primary += secondary - caps.1;
            secondary = caps.1;
        }
        (primary, secondary)
    }
}

impl AllocationStrategy for TwoTierStrategy<'_> {
    fn name(&self) -> &str {
        "two-tier"
    }

    fn weights_for_period(&self, period: &PeriodContext<'_>) -> AllocationResult {
        let instruments = self.catalog.instruments();
        let monthly_yield = |idx: usize| {
            self.model.month_yield(&instruments[idx], period.month, &period.scenario) / 12.0
        };

        let primary_yield = monthly_yield(self.primary);
        let secondary_yield = monthly_yield(self.secondary);
        let primary_fraction = if primary_yield > secondary_yield {
            self.policy.primary_dominant_share
        } else {
            self.policy.secondary_dominant_share
        };

        let (primary, secondary) = self.dynamic_split(primary_fraction);
        let mut weights = vec![0.0; instruments.len()];
        weights[self.fixed] = self.policy.fixed_share;
        weights[self.primary] = primary;
        weights[self.secondary] = secondary;

        let expected = self.policy.fixed_share * monthly_yield(self.fixed)
            + primary * primary_yield
            + secondary * secondary_yield;

        AllocationResult {
            weights: WeightMapping::from_vector(self.catalog, &weights),
            objective: -expected,
            iterations: 0,
            status: SolveStatus::Converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{ScenarioKey, ScenarioTables};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_primary_dominant_split_is_capped() {
        let catalog = InstrumentCatalog::default_catalog();
        let tables = ScenarioTables::default_forecast();
        let scenario = tables.resolve(&ScenarioKey::base()).unwrap();
        let strategy =
            TwoTierStrategy::new(&catalog, YieldModel::default(), TwoTierPolicy::default()).unwrap();

        let result = strategy.weights_for_period(&PeriodContext::new(0, scenario));
        let w = &result.weights;

        // 0.7 * 0.9 = 0.63 exceeds the fund cap of 0.5; the excess goes to foreign cash
        assert_abs_diff_eq!(w.weight("Bank Deposit CR-0.5"), 0.30, epsilon = 1e-12);
        assert_abs_diff_eq!(w.weight("Money Market Fund"), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(w.weight("Foreign Cash"), 0.2, epsilon = 1e-12);
        assert_eq!(w.weight("Structured Note"), 0.0);
        assert!(w.is_feasible(&catalog));
    }

    #[test]
    fn test_secondary_dominant_split() {
        let catalog = InstrumentCatalog::default_catalog();
        let mut tables = ScenarioTables::default_forecast();
        // Rouble collapse: foreign cash beats the fund
        tables.fx.insert("collapse", vec![80.0, 160.0]).unwrap();
        let key = ScenarioKey::new("constant", "base", "collapse");
        let scenario = tables.resolve(&key).unwrap();
        let strategy =
            TwoTierStrategy::new(&catalog, YieldModel::default(), TwoTierPolicy::default()).unwrap();

        let result = strategy.weights_for_period(&PeriodContext::new(0, scenario));
        assert_abs_diff_eq!(result.weights.weight("Money Market Fund"), 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(result.weights.weight("Foreign Cash"), 0.35, epsilon = 1e-12);
        assert!(result.weights.is_feasible(&catalog));
    }

    #[test]
    fn test_policy_validation() {
        let catalog = InstrumentCatalog::default_catalog();

        let policy = TwoTierPolicy {
            secondary: "Money Market Fund".to_string(),
            ..Default::default()
        };
        assert!(TwoTierStrategy::new(&catalog, YieldModel::default(), policy).is_err());

        let policy = TwoTierPolicy {
            fixed_share: 0.05,
            ..Default::default()
        };
        assert!(matches!(
            TwoTierStrategy::new(&catalog, YieldModel::default(), policy),
            Err(ConfigError::InfeasibleBounds { .. })
        ));

        let policy = TwoTierPolicy {
            primary: "Gold".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            TwoTierStrategy::new(&catalog, YieldModel::default(), policy),
            Err(ConfigError::UnknownInstrument { .. })
        ));
    }
}
