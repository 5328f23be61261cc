//! Constrained allocation search over the weight simplex

use log::{debug, warn};
use serde::Serialize;

use super::config::OptimizerConfig;
use super::objective::{coverage_penalty, negative_income, period_objective};
use super::solver::{Minimizer, ProjectedGradient, SimplexRegion};
use super::weights::{WeightMapping, WEIGHT_SUM_TOLERANCE};
use crate::assumptions::{ResolvedScenario, ScenarioKey};
use crate::error::{ConfigError, Result};
use crate::projection::{SimulationEngine, SimulationRecord};

/// Whether the solver met its tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Converged,
    /// Solver gave up; weights are the uniform starting point
    Degraded,
}

/// Weights produced by one solve
#[derive(Debug, Clone, Serialize)]
pub struct AllocationResult {
    pub weights: WeightMapping,
    pub objective: f64,
    pub iterations: usize,
    pub status: SolveStatus,
}

impl AllocationResult {
    pub fn is_degraded(&self) -> bool {
        self.status == SolveStatus::Degraded
    }
}

/// Income-maximizing allocation for a horizon
#[derive(Debug, Clone, Serialize)]
pub struct IncomePlan {
    pub years: usize,
    pub allocation: AllocationResult,
    pub records: Vec<SimulationRecord>,
    pub total_income: f64,
    pub average_monthly_income: f64,
    /// Total income relative to starting capital, percent
    pub profit_pct: f64,
}

/// Optimizer over a fixed catalog and simulation config.
///
/// Generic over the minimization algorithm; full-horizon and single-period
/// problems get separate solver instances so their iteration caps can differ.
pub struct AllocationOptimizer<'a, M = ProjectedGradient> {
    engine: SimulationEngine<'a>,
    config: OptimizerConfig,
    region: SimplexRegion,
    horizon_solver: M,
    period_solver: M,
}

impl<'a> AllocationOptimizer<'a, ProjectedGradient> {
    pub fn new(engine: SimulationEngine<'a>, config: OptimizerConfig) -> Result<Self> {
        let horizon_solver = config.horizon_solver();
        let period_solver = config.period_solver();
        Self::with_solvers(engine, config, horizon_solver, period_solver)
    }
}

impl<'a, M: Minimizer> AllocationOptimizer<'a, M> {
    /// Validates the simulation config and the catalog's bounds up front
    pub fn with_solvers(
        engine: SimulationEngine<'a>,
        config: OptimizerConfig,
        horizon_solver: M,
        period_solver: M,
    ) -> Result<Self> {
        engine.config().validate()?;
        if !(config.tolerance.is_finite() && config.tolerance > 0.0) {
            return Err(ConfigError::invalid_value("tolerance", "must be positive"));
        }
        let region = SimplexRegion::fully_invested(engine.catalog().upper_bounds())?;

        Ok(Self {
            engine,
            config,
            region,
            horizon_solver,
            period_solver,
        })
    }

    pub fn engine(&self) -> &SimulationEngine<'a> {
        &self.engine
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn region(&self) -> &SimplexRegion {
        &self.region
    }

    /// Minimize the coverage/decline/concentration penalty over the configured horizon
    pub fn optimize(&self, key: &ScenarioKey, target_coverage: f64) -> Result<AllocationResult> {
        if !(target_coverage.is_finite() && target_coverage > 0.0) {
            return Err(ConfigError::invalid_value(
                "target_coverage",
                format!("must be positive, got {}", target_coverage),
            ));
        }

        let scenario = self.engine.resolve(key)?;
        let years = self.engine.config().horizon_years;
        let target_income = self.engine.config().target_monthly_income;
        let penalize_decline = !scenario.capital_growth.is_planned_decline();
        let penalties = self.config.penalties;

        let objective = |w: &[f64]| -> f64 {
            let records = self.engine.simulate_annual_resolved(w, &scenario, years);
            coverage_penalty(
                &records,
                w,
                target_income,
                target_coverage,
                penalize_decline,
                &penalties,
            )
        };

        Ok(self.solve(&self.horizon_solver, &objective, &key.to_string()))
    }

    /// Allocation with the highest total income over `years`
    pub fn maximize_income(&self, key: &ScenarioKey, years: usize) -> Result<IncomePlan> {
        if years == 0 {
            return Err(ConfigError::invalid_value("years", "must be at least 1"));
        }

        let scenario = self.engine.resolve(key)?;
        let objective = |w: &[f64]| -> f64 {
            negative_income(&self.engine.simulate_annual_resolved(w, &scenario, years))
        };

        let allocation = self.solve(
            &self.horizon_solver,
            &objective,
            &format!("{} max income {}y", key, years),
        );
        let weights = allocation.weights.to_vector(self.engine.catalog())?;
        let records = self.engine.simulate_annual_resolved(&weights, &scenario, years);

        let total_income: f64 = records.iter().map(|r| r.income).sum();
        let starting_capital = self.engine.config().total_capital();

        Ok(IncomePlan {
            years,
            allocation,
            records,
            total_income,
            average_monthly_income: total_income / (years * 12) as f64,
            profit_pct: total_income / starting_capital * 100.0,
        })
    }

    /// Best allocation for a single year's projected yields
    pub fn optimize_period(&self, key: &ScenarioKey, year: usize) -> Result<AllocationResult> {
        let scenario = self.engine.resolve(key)?;
        Ok(self.optimize_period_resolved(&scenario, year))
    }

    pub fn optimize_period_resolved(
        &self,
        scenario: &ResolvedScenario<'_>,
        year: usize,
    ) -> AllocationResult {
        let model = self.engine.yield_model();
        let yields: Vec<f64> = self
            .engine
            .catalog()
            .iter()
            .map(|instrument| model.year_yield(instrument, year, scenario))
            .collect();
        let concentration = self.config.penalties.period_concentration;

        let objective = |w: &[f64]| -> f64 { period_objective(w, &yields, concentration) };
        self.solve(&self.period_solver, &objective, &format!("year {}", year + 1))
    }

    fn initial_guess(&self) -> Vec<f64> {
        let n = self.region.dim();
        vec![1.0 / n as f64; n]
    }

    fn solve(&self, solver: &M, objective: &dyn Fn(&[f64]) -> f64, label: &str) -> AllocationResult {
        let catalog = self.engine.catalog();
        let initial = self.initial_guess();
        let outcome = solver.minimize(objective, &self.region, &initial);

        let usable = outcome.converged
            && outcome.objective.is_finite()
            && self.region.contains(&outcome.solution, WEIGHT_SUM_TOLERANCE);

        if usable {
            debug!(
                "{}: converged in {} iterations, objective {:.6}",
                label, outcome.iterations, outcome.objective
            );
            return AllocationResult {
                weights: WeightMapping::from_vector(catalog, &outcome.solution),
                objective: outcome.objective,
                iterations: outcome.iterations,
                status: SolveStatus::Converged,
            };
        }

        warn!(
            "{}: solver did not converge in {} iterations, using uniform allocation",
            label, outcome.iterations
        );
        let fallback = self.region.project(&initial);
        AllocationResult {
            objective: objective(&fallback),
            weights: WeightMapping::from_vector(catalog, &fallback),
            iterations: outcome.iterations,
            status: SolveStatus::Degraded,
        }
    }
}
