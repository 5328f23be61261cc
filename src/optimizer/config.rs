//! Optimizer settings

use serde::{Deserialize, Serialize};

use super::objective::PenaltyWeights;
use super::solver::ProjectedGradient;

/// Solver limits and penalty multipliers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Iteration cap for full-horizon solves
    pub max_iterations: usize,

    /// Iteration cap for single-period solves
    pub period_max_iterations: usize,

    /// Relative objective change treated as converged
    pub tolerance: f64,

    pub penalties: PenaltyWeights,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            period_max_iterations: 200,
            tolerance: 1e-6,
            penalties: PenaltyWeights::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn horizon_solver(&self) -> ProjectedGradient {
        ProjectedGradient::new(self.max_iterations, self.tolerance)
    }

    pub fn period_solver(&self) -> ProjectedGradient {
        ProjectedGradient::new(self.period_max_iterations, self.tolerance)
    }
}
