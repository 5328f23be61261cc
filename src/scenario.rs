//! Scenario runner for batch optimization and comparison
//!
//! Holds assumptions and configs once, then optimizes and simulates any number of
//! scenario triples. Comparisons run in parallel; each task builds its own optimizer.

use std::path::Path;

use log::info;
use rayon::prelude::*;
use serde::Serialize;

use crate::assumptions::{Assumptions, ScenarioKey};
use crate::error::{ConfigError, Result};
use crate::optimizer::{AllocationOptimizer, AllocationResult, IncomePlan, OptimizerConfig};
use crate::projection::{AllocationBreakdown, SimulationConfig, SimulationEngine, SimulationRecord, SimulationSummary};
use crate::strategy::{
    RebalanceFrequency, RebalanceRecord, RebalanceSummary, RebalancingEngine, StrategyKind,
};

/// Optimized allocation for one scenario with its projection
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub key: ScenarioKey,
    pub allocation: AllocationResult,
    pub records: Vec<SimulationRecord>,
    pub summary: SimulationSummary,
    pub breakdown: AllocationBreakdown,
}

/// One row of a scenario comparison
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioComparison {
    pub label: String,
    pub key: ScenarioKey,
    /// Annualized percent
    pub average_yield_pct: f64,
    pub average_monthly_income: f64,
    pub ending_capital: f64,
    /// Average monthly income / target
    pub average_coverage: f64,
    pub degraded: bool,
}

/// The five standard comparison cases: base, capital decline and growth, and the
/// pessimistic and optimistic macro paths
pub fn default_comparison_set() -> Vec<(String, ScenarioKey)> {
    [
        ("Base", "constant", "base", "base"),
        ("Capital -5%", "decrease_5", "base", "base"),
        ("Capital +5%", "increase_5", "base", "base"),
        ("Pessimistic", "constant", "pessimistic", "pessimistic"),
        ("Optimistic", "constant", "optimistic", "optimistic"),
    ]
    .into_iter()
    .map(|(label, capital, rate, fx)| (label.to_string(), ScenarioKey::new(capital, rate, fx)))
    .collect()
}

/// Pre-loaded runner for repeated scenario analysis
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    assumptions: Assumptions,
    config: SimulationConfig,
    optimizer_config: OptimizerConfig,
}

impl ScenarioRunner {
    /// Runner over the in-memory default forecast
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_assumptions(Assumptions::default_forecast(), config)
    }

    /// Runner over assumptions loaded from a CSV directory
    pub fn from_csv_path(path: &Path, config: SimulationConfig) -> Result<Self> {
        Ok(Self::with_assumptions(Assumptions::from_csv_path(path)?, config))
    }

    pub fn with_assumptions(assumptions: Assumptions, config: SimulationConfig) -> Self {
        Self {
            assumptions,
            config,
            optimizer_config: OptimizerConfig::default(),
        }
    }

    pub fn with_optimizer_config(mut self, optimizer_config: OptimizerConfig) -> Self {
        self.optimizer_config = optimizer_config;
        self
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn optimizer_config(&self) -> &OptimizerConfig {
        &self.optimizer_config
    }

    pub fn engine(&self) -> SimulationEngine<'_> {
        SimulationEngine::new(&self.assumptions, &self.config)
    }

    pub fn optimizer(&self) -> Result<AllocationOptimizer<'_>> {
        AllocationOptimizer::new(self.engine(), self.optimizer_config.clone())
    }

    /// Optimize for `key` and project the result over the configured horizon
    pub fn run(&self, key: &ScenarioKey, target_coverage: f64) -> Result<ScenarioOutcome> {
        info!("Optimizing scenario {}", key);
        let optimizer = self.optimizer()?;
        let engine = optimizer.engine();

        let allocation = optimizer.optimize(key, target_coverage)?;
        let records = engine.simulate_annual(&allocation.weights, key, self.config.horizon_years)?;
        let summary = SimulationSummary::from_records(&records, self.config.target_monthly_income);
        let breakdown = engine.allocation_breakdown(&allocation.weights, key)?;

        Ok(ScenarioOutcome {
            key: key.clone(),
            allocation,
            records,
            summary,
            breakdown,
        })
    }

    /// Optimize and summarize each labeled scenario in parallel, preserving input order
    pub fn compare(&self, scenarios: &[(String, ScenarioKey)]) -> Result<Vec<ScenarioComparison>> {
        info!("Comparing {} scenarios", scenarios.len());
        scenarios
            .par_iter()
            .map(|(label, key)| -> Result<ScenarioComparison> {
                let outcome = self.run(key, 1.0)?;
                Ok(ScenarioComparison {
                    label: label.clone(),
                    key: key.clone(),
                    average_yield_pct: outcome.summary.average_yield_pct,
                    average_monthly_income: outcome.summary.average_monthly_income,
                    ending_capital: outcome.summary.ending_capital,
                    average_coverage: outcome.summary.average_coverage,
                    degraded: outcome.allocation.is_degraded(),
                })
            })
            .collect()
    }

    /// Monthly run of a strategy with rebalancing on `frequency`
    pub fn rebalance(
        &self,
        kind: &StrategyKind,
        key: &ScenarioKey,
        years: usize,
        frequency: RebalanceFrequency,
    ) -> Result<Vec<RebalanceRecord>> {
        if years == 0 {
            return Err(ConfigError::invalid_value("years", "must be at least 1"));
        }
        let optimizer = self.optimizer()?;
        let strategy = kind.build(&optimizer, key)?;
        RebalancingEngine::new(*optimizer.engine()).run(strategy.as_ref(), key, years, frequency)
    }

    /// Period-optimizer runs under every rebalancing frequency
    pub fn compare_rebalancing(&self, key: &ScenarioKey, years: usize) -> Result<Vec<RebalanceSummary>> {
        info!("Comparing rebalancing frequencies for {} over {} years", key, years);
        let initial_capital = self.config.total_capital();
        RebalanceFrequency::ALL
            .par_iter()
            .map(|&frequency| -> Result<RebalanceSummary> {
                let records = self.rebalance(&StrategyKind::PeriodOptimizer, key, years, frequency)?;
                Ok(RebalanceSummary::from_records(frequency, &records, initial_capital))
            })
            .collect()
    }

    /// Income-maximizing allocation over `years`
    pub fn max_profit(&self, key: &ScenarioKey, years: usize) -> Result<IncomePlan> {
        info!("Maximizing income for {} over {} years", key, years);
        self.optimizer()?.maximize_income(key, years)
    }

    /// Income-maximizing plans for every horizon from 1 to `max_years`
    pub fn compare_horizons(&self, key: &ScenarioKey, max_years: usize) -> Result<Vec<IncomePlan>> {
        if max_years == 0 {
            return Err(ConfigError::invalid_value("max_years", "must be at least 1"));
        }
        (1..=max_years)
            .into_par_iter()
            .map(|years| -> Result<IncomePlan> { self.optimizer()?.maximize_income(key, years) })
            .collect()
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}
