//! Allocation optimizer: penalty objectives minimized over the bounded weight simplex

mod allocation;
mod config;
mod objective;
mod solver;
mod weights;

pub use allocation::{AllocationOptimizer, AllocationResult, IncomePlan, SolveStatus};
pub use config::OptimizerConfig;
pub use objective::{coverage_penalty, negative_income, period_objective, PenaltyWeights};
pub use solver::{Minimizer, ProjectedGradient, SimplexRegion, SolverOutcome};
pub use weights::{WeightMapping, WEIGHT_SUM_TOLERANCE};
