//! Simulation parameters

use serde::{Deserialize, Serialize};

use super::yields::{YieldModel, DEFAULT_FX_SPREAD_PCT, DEFAULT_TAX_RATE};
use crate::error::{ConfigError, Result};

/// Weights at or below this are treated as optimizer noise
pub const DEFAULT_WEIGHT_THRESHOLD: f64 = 0.001;

/// Configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Initial capital held in the domestic currency
    pub initial_domestic_capital: f64,

    /// Initial holding in foreign-currency units
    pub initial_foreign_amount: f64,

    /// Spot rate at start: domestic units per foreign unit
    pub spot_fx_rate: f64,

    /// Monthly income target in domestic units
    pub target_monthly_income: f64,

    /// Horizon of the annual simulation
    pub horizon_years: usize,

    /// Bid/ask spread on currency conversion, percent of the rate
    pub fx_spread_pct: f64,

    /// Income tax applied to taxable instruments (fraction)
    pub tax_rate: f64,

    /// Rebalancing commission, percent of moved capital
    pub transaction_cost_pct: f64,

    /// Weights at or below this do not contribute to portfolio yield
    pub weight_threshold: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_domestic_capital: 4_000_000.0,
            initial_foreign_amount: 10_000.0,
            spot_fx_rate: 81.17,
            target_monthly_income: 50_000.0,
            horizon_years: 3,
            fx_spread_pct: DEFAULT_FX_SPREAD_PCT,
            tax_rate: DEFAULT_TAX_RATE,
            transaction_cost_pct: 0.1,
            weight_threshold: DEFAULT_WEIGHT_THRESHOLD,
        }
    }
}

impl SimulationConfig {
    /// Total starting capital in domestic units
    pub fn total_capital(&self) -> f64 {
        self.initial_domestic_capital + self.initial_foreign_amount * self.spot_fx_rate
    }

    /// Foreign-currency share of the starting capital (fraction)
    pub fn initial_foreign_share(&self) -> f64 {
        let total = self.total_capital();
        if total > 0.0 {
            self.initial_foreign_amount * self.spot_fx_rate / total
        } else {
            0.0
        }
    }

    pub fn yield_model(&self) -> YieldModel {
        YieldModel::new(self.tax_rate, self.fx_spread_pct)
    }

    pub fn horizon_months(&self) -> usize {
        self.horizon_years * 12
    }

    /// Reject non-finite and out-of-range parameters
    pub fn validate(&self) -> Result<()> {
        non_negative("initial_domestic_capital", self.initial_domestic_capital)?;
        non_negative("initial_foreign_amount", self.initial_foreign_amount)?;
        non_negative("transaction_cost_pct", self.transaction_cost_pct)?;

        if !self.spot_fx_rate.is_finite() || self.spot_fx_rate <= 0.0 {
            return Err(ConfigError::invalid_value("spot_fx_rate", "must be positive"));
        }
        if !self.target_monthly_income.is_finite() || self.target_monthly_income <= 0.0 {
            return Err(ConfigError::invalid_value(
                "target_monthly_income",
                "must be positive",
            ));
        }
        if self.horizon_years == 0 {
            return Err(ConfigError::invalid_value("horizon_years", "must be at least 1"));
        }
        if !(0.0..200.0).contains(&self.fx_spread_pct) {
            return Err(ConfigError::invalid_value(
                "fx_spread_pct",
                "must be in [0, 200)",
            ));
        }
        if !(0.0..1.0).contains(&self.tax_rate) {
            return Err(ConfigError::invalid_value("tax_rate", "must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.weight_threshold) {
            return Err(ConfigError::invalid_value(
                "weight_threshold",
                "must be in [0, 1)",
            ));
        }
        if self.total_capital() <= 0.0 {
            return Err(ConfigError::invalid_config("total starting capital is zero"));
        }
        Ok(())
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            field,
            format!("must be finite and non-negative, got {}", value),
        ))
    }
}
