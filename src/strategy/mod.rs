//! Allocation strategies and the monthly rebalancing loop
//!
//! A strategy decides the weights in force for a given month. The rebalancing
//! engine asks for new weights on its schedule and charges the turnover cost.

mod rebalance;
mod two_tier;

pub use rebalance::{RebalanceFrequency, RebalanceRecord, RebalanceSummary, RebalancingEngine};
pub use two_tier::{TwoTierPolicy, TwoTierStrategy};

use serde::{Deserialize, Serialize};

use crate::assumptions::{ResolvedScenario, ScenarioKey};
use crate::error::Result;
use crate::optimizer::{AllocationOptimizer, AllocationResult, Minimizer};

/// Month being allocated and the scenario paths in force
#[derive(Debug, Clone, Copy)]
pub struct PeriodContext<'a> {
    /// 0-indexed month from the start of the horizon
    pub month: usize,
    /// 0-indexed year containing `month`
    pub year: usize,
    pub scenario: ResolvedScenario<'a>,
}

impl<'a> PeriodContext<'a> {
    pub fn new(month: usize, scenario: ResolvedScenario<'a>) -> Self {
        Self {
            month,
            year: month / 12,
            scenario,
        }
    }
}

/// Produces the weights to hold for a month
pub trait AllocationStrategy {
    fn name(&self) -> &str;

    fn weights_for_period(&self, period: &PeriodContext<'_>) -> AllocationResult;
}

/// Re-solves the single-period problem for the year containing each month
pub struct PeriodOptimizer<'o, 'a, M: Minimizer> {
    optimizer: &'o AllocationOptimizer<'a, M>,
}

impl<'o, 'a, M: Minimizer> PeriodOptimizer<'o, 'a, M> {
    pub fn new(optimizer: &'o AllocationOptimizer<'a, M>) -> Self {
        Self { optimizer }
    }
}

impl<M: Minimizer> AllocationStrategy for PeriodOptimizer<'_, '_, M> {
    fn name(&self) -> &str {
        "period-optimizer"
    }

    fn weights_for_period(&self, period: &PeriodContext<'_>) -> AllocationResult {
        self.optimizer
            .optimize_period_resolved(&period.scenario, period.year)
    }
}

/// Weights solved once up front and returned for every month
#[derive(Debug, Clone)]
pub struct FixedAllocation {
    name: String,
    allocation: AllocationResult,
}

impl FixedAllocation {
    pub fn new(name: impl Into<String>, allocation: AllocationResult) -> Self {
        Self {
            name: name.into(),
            allocation,
        }
    }

    pub fn allocation(&self) -> &AllocationResult {
        &self.allocation
    }
}

impl AllocationStrategy for FixedAllocation {
    fn name(&self) -> &str {
        &self.name
    }

    fn weights_for_period(&self, _period: &PeriodContext<'_>) -> AllocationResult {
        self.allocation.clone()
    }
}

/// Strategy selection, as read from the command line or a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Optimize each year's yields independently
    #[default]
    PeriodOptimizer,
    /// Full-horizon coverage optimum, held throughout
    CoverageOptimizer { target_coverage: f64 },
    /// Full-horizon income maximum, held throughout
    ProfitMaximizer,
    TwoTier(TwoTierPolicy),
}

impl StrategyKind {
    /// Build the strategy; full-horizon variants are solved here against `key`
    pub fn build<'o, 'a: 'o, M: Minimizer + 'o>(
        &self,
        optimizer: &'o AllocationOptimizer<'a, M>,
        key: &ScenarioKey,
    ) -> Result<Box<dyn AllocationStrategy + 'o>> {
        let strategy: Box<dyn AllocationStrategy + 'o> = match self {
            StrategyKind::PeriodOptimizer => Box::new(PeriodOptimizer::new(optimizer)),
            StrategyKind::CoverageOptimizer { target_coverage } => Box::new(FixedAllocation::new(
                "coverage-optimizer",
                optimizer.optimize(key, *target_coverage)?,
            )),
            StrategyKind::ProfitMaximizer => {
                let years = optimizer.engine().config().horizon_years;
                let plan = optimizer.maximize_income(key, years)?;
                Box::new(FixedAllocation::new("profit-maximizer", plan.allocation))
            }
            StrategyKind::TwoTier(policy) => {
                let engine = optimizer.engine();
                Box::new(TwoTierStrategy::new(
                    engine.catalog(),
                    engine.yield_model(),
                    policy.clone(),
                )?)
            }
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::Assumptions;
    use crate::optimizer::OptimizerConfig;
    use crate::projection::{SimulationConfig, SimulationEngine};

    #[test]
    fn test_period_context_year() {
        let assumptions = Assumptions::default_forecast();
        let scenario = assumptions.scenarios.resolve(&ScenarioKey::base()).unwrap();

        assert_eq!(PeriodContext::new(0, scenario).year, 0);
        assert_eq!(PeriodContext::new(11, scenario).year, 0);
        assert_eq!(PeriodContext::new(12, scenario).year, 1);
    }

    #[test]
    fn test_build_every_kind() {
        let assumptions = Assumptions::default_forecast();
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&assumptions, &config);
        let optimizer = AllocationOptimizer::new(engine, OptimizerConfig::default()).unwrap();
        let key = ScenarioKey::base();
        let scenario = engine.resolve(&key).unwrap();

        let kinds = [
            StrategyKind::PeriodOptimizer,
            StrategyKind::CoverageOptimizer { target_coverage: 1.0 },
            StrategyKind::ProfitMaximizer,
            StrategyKind::TwoTier(TwoTierPolicy::default()),
        ];
        for kind in &kinds {
            let strategy = kind.build(&optimizer, &key).unwrap();
            let first = strategy.weights_for_period(&PeriodContext::new(0, scenario));
            assert!(first.weights.is_feasible(&assumptions.catalog), "{}", strategy.name());
        }
    }

    #[test]
    fn test_fixed_allocation_ignores_period() {
        let assumptions = Assumptions::default_forecast();
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&assumptions, &config);
        let optimizer = AllocationOptimizer::new(engine, OptimizerConfig::default()).unwrap();
        let key = ScenarioKey::base();
        let scenario = engine.resolve(&key).unwrap();

        let strategy = StrategyKind::ProfitMaximizer.build(&optimizer, &key).unwrap();
        let early = strategy.weights_for_period(&PeriodContext::new(0, scenario));
        let late = strategy.weights_for_period(&PeriodContext::new(30, scenario));
        assert_eq!(early.weights, late.weights);
    }

    #[test]
    fn test_strategy_kind_from_json() {
        let kind: StrategyKind =
            serde_json::from_str(r#"{"kind": "coverage_optimizer", "target_coverage": 1.2}"#).unwrap();
        assert_eq!(kind, StrategyKind::CoverageOptimizer { target_coverage: 1.2 });

        let kind: StrategyKind =
            serde_json::from_str(r#"{"kind": "two_tier", "fixed_share": 0.4}"#).unwrap();
        match kind {
            StrategyKind::TwoTier(policy) => {
                assert_eq!(policy.fixed_share, 0.4);
                assert_eq!(policy.primary, "Money Market Fund");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
