//! Penalty objectives minimized by the allocation optimizer

use serde::{Deserialize, Serialize};

use crate::projection::SimulationRecord;

/// Multipliers of each penalty term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    /// Squared coverage shortfall, summed over years
    pub shortfall: f64,

    /// Squared capital decline, summed over years
    pub capital_decline: f64,

    /// Sum of squared weights in the full-horizon objective
    pub concentration: f64,

    /// Sum of squared weights in the single-period objective
    pub period_concentration: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            shortfall: 100.0,
            capital_decline: 50.0,
            concentration: 10.0,
            period_concentration: 5.0,
        }
    }
}

fn sum_of_squares(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

/// Full-horizon penalty for a simulated allocation
pub fn coverage_penalty(
    records: &[SimulationRecord],
    weights: &[f64],
    target_monthly_income: f64,
    target_coverage: f64,
    penalize_decline: bool,
    penalties: &PenaltyWeights,
) -> f64 {
    let mut shortfall = 0.0;
    let mut decline = 0.0;

    for record in records {
        let coverage = record.coverage(target_monthly_income);
        if coverage < target_coverage {
            shortfall += (target_coverage - coverage).powi(2);
        }

        if penalize_decline && record.capital_start > 0.0 {
            let ratio = record.capital_end / record.capital_start;
            if ratio < 1.0 {
                decline += (1.0 - ratio).powi(2);
            }
        }
    }

    shortfall * penalties.shortfall
        + decline * penalties.capital_decline
        + sum_of_squares(weights) * penalties.concentration
}

/// Negative total income, scaled by starting capital
pub fn negative_income(records: &[SimulationRecord]) -> f64 {
    let Some(first) = records.first() else {
        return 0.0;
    };
    let total: f64 = records.iter().map(|r| r.income).sum();
    if first.capital_start > 0.0 {
        -total / first.capital_start
    } else {
        -total
    }
}

/// Single-period objective: negative expected yield (%) plus concentration
pub fn period_objective(weights: &[f64], yields_pct: &[f64], concentration: f64) -> f64 {
    let expected: f64 = weights.iter().zip(yields_pct).map(|(w, y)| w * y).sum();
    -expected + sum_of_squares(weights) * concentration
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(start: f64, monthly_income: f64, end: f64) -> SimulationRecord {
        SimulationRecord {
            period: 1,
            year: 1,
            capital_start: start,
            portfolio_yield_pct: 0.0,
            income: monthly_income * 12.0,
            monthly_income,
            growth_delta: 0.0,
            capital_end: end,
            foreign_share_pct: 0.0,
        }
    }

    #[test]
    fn test_penalty_terms() {
        let penalties = PenaltyWeights::default();
        let weights = [0.5, 0.5];
        let records = vec![record(100.0, 40.0, 90.0)];

        // shortfall (1 - 0.8)^2 * 100 = 4, decline 0.1^2 * 50 = 0.5, concentration 0.5 * 10 = 5
        let penalty = coverage_penalty(&records, &weights, 50.0, 1.0, true, &penalties);
        assert_relative_eq!(penalty, 9.5, epsilon = 1e-9);

        // Planned decline skips the decline term
        let penalty = coverage_penalty(&records, &weights, 50.0, 1.0, false, &penalties);
        assert_relative_eq!(penalty, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_shortfall_above_target() {
        let penalties = PenaltyWeights::default();
        let records = vec![record(100.0, 60.0, 110.0)];
        let penalty = coverage_penalty(&records, &[1.0], 50.0, 1.0, true, &penalties);
        assert_relative_eq!(penalty, 10.0);
    }

    #[test]
    fn test_period_objective() {
        assert_relative_eq!(
            period_objective(&[0.5, 0.5], &[10.0, 20.0], 5.0),
            -15.0 + 2.5
        );
    }
}
