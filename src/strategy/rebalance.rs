//! Monthly simulation with periodic re-allocation and transaction costs

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{AllocationStrategy, PeriodContext};
use crate::assumptions::ScenarioKey;
use crate::error::{ConfigError, Result};
use crate::optimizer::WeightMapping;
use crate::projection::SimulationEngine;

/// How often the strategy is asked for new weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceFrequency {
    Monthly,
    Quarterly,
    Annual,
    /// Initial allocation only
    None,
}

impl RebalanceFrequency {
    pub const ALL: [RebalanceFrequency; 4] = [
        RebalanceFrequency::Monthly,
        RebalanceFrequency::Quarterly,
        RebalanceFrequency::Annual,
        RebalanceFrequency::None,
    ];

    /// Whether weights are reset in a 0-indexed month
    pub fn is_rebalance_month(&self, month: usize) -> bool {
        match self {
            RebalanceFrequency::Monthly => true,
            RebalanceFrequency::Quarterly => month % 3 == 0,
            RebalanceFrequency::Annual => month % 12 == 0,
            RebalanceFrequency::None => month == 0,
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RebalanceFrequency::Monthly => "monthly",
            RebalanceFrequency::Quarterly => "quarterly",
            RebalanceFrequency::Annual => "annual",
            RebalanceFrequency::None => "none",
        };
        f.write_str(label)
    }
}

impl FromStr for RebalanceFrequency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(RebalanceFrequency::Monthly),
            "quarterly" => Ok(RebalanceFrequency::Quarterly),
            "annual" | "yearly" => Ok(RebalanceFrequency::Annual),
            "none" => Ok(RebalanceFrequency::None),
            other => Err(ConfigError::invalid_value(
                "frequency",
                format!("unknown rebalance frequency '{}'", other),
            )),
        }
    }
}

/// One month of a rebalancing run
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceRecord {
    /// 1-indexed month
    pub month: usize,
    pub year: usize,
    pub month_in_year: usize,

    /// Capital at month end, after costs and income
    pub capital: f64,

    pub monthly_income: f64,

    /// Income relative to capital at month start, percent
    pub return_pct: f64,

    /// Weights were set this month (always true for month 1)
    pub rebalanced: bool,

    pub transaction_cost: f64,

    /// Weights in force came from a degraded solve
    pub degraded: bool,

    /// Snapshot of the weights in force during the month
    pub weights: WeightMapping,
}

/// Aggregate results of a rebalancing run
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceSummary {
    pub frequency: RebalanceFrequency,
    pub final_capital: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub average_monthly_income: f64,
    pub rebalance_count: usize,
    pub total_transaction_cost: f64,
    pub degraded_months: usize,
}

impl RebalanceSummary {
    pub fn from_records(
        frequency: RebalanceFrequency,
        records: &[RebalanceRecord],
        initial_capital: f64,
    ) -> Self {
        let final_capital = records.last().map_or(initial_capital, |r| r.capital);
        let profit = final_capital - initial_capital;
        let months = records.len().max(1) as f64;

        Self {
            frequency,
            final_capital,
            profit,
            profit_pct: if initial_capital > 0.0 {
                profit / initial_capital * 100.0
            } else {
                0.0
            },
            average_monthly_income: records.iter().map(|r| r.monthly_income).sum::<f64>() / months,
            rebalance_count: records.iter().filter(|r| r.rebalanced).count(),
            total_transaction_cost: records.iter().map(|r| r.transaction_cost).sum(),
            degraded_months: records.iter().filter(|r| r.degraded).count(),
        }
    }
}

/// Runs a strategy month by month, re-allocating on schedule
#[derive(Debug, Clone, Copy)]
pub struct RebalancingEngine<'a> {
    engine: SimulationEngine<'a>,
}

impl<'a> RebalancingEngine<'a> {
    pub fn new(engine: SimulationEngine<'a>) -> Self {
        Self { engine }
    }

    /// Commission for moving from `current` to `target` on `capital`
    pub fn transaction_cost(&self, current: &WeightMapping, target: &WeightMapping, capital: f64) -> f64 {
        current.turnover(target) * capital * self.engine.config().transaction_cost_pct / 100.0
    }

    pub fn run(
        &self,
        strategy: &dyn AllocationStrategy,
        key: &ScenarioKey,
        years: usize,
        frequency: RebalanceFrequency,
    ) -> Result<Vec<RebalanceRecord>> {
        let scenario = self.engine.resolve(key)?;
        let catalog = self.engine.catalog();
        let months = years * 12;
        info!(
            "Rebalancing {} over {} months: {}, {}",
            strategy.name(),
            months,
            key,
            frequency
        );

        let mut state = self.engine.initial_state();
        let initial = strategy.weights_for_period(&PeriodContext::new(0, scenario));
        let mut degraded = initial.is_degraded();
        let mut current = initial.weights;
        let mut vector = current.to_vector(catalog)?;

        let mut records = Vec::with_capacity(months);
        for month in 0..months {
            let scheduled = frequency.is_rebalance_month(month);
            let mut cost = 0.0;

            if scheduled && month > 0 {
                let candidate = strategy.weights_for_period(&PeriodContext::new(month, scenario));
                cost = self.transaction_cost(&current, &candidate.weights, state.capital);
                state.charge(cost);

                debug!(
                    "Month {}: rebalanced, turnover {:.4}, cost {:.2}",
                    month + 1,
                    current.turnover(&candidate.weights),
                    cost
                );
                degraded = candidate.is_degraded();
                current = candidate.weights;
                vector = current.to_vector(catalog)?;
            }

            let step = self.engine.step_month(&mut state, &vector, &scenario);
            records.push(RebalanceRecord {
                month: month + 1,
                year: month / 12 + 1,
                month_in_year: month % 12 + 1,
                capital: step.capital_end,
                monthly_income: step.income,
                return_pct: step.portfolio_yield_pct / 12.0,
                rebalanced: scheduled,
                transaction_cost: cost,
                degraded,
                weights: current.clone(),
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{Assumptions, ScenarioTables};
    use crate::optimizer::{AllocationOptimizer, OptimizerConfig};
    use crate::projection::SimulationConfig;
    use crate::strategy::{PeriodOptimizer, TwoTierPolicy, TwoTierStrategy};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_schedule() {
        let months: Vec<usize> = (0..24)
            .filter(|m| RebalanceFrequency::Quarterly.is_rebalance_month(*m))
            .collect();
        assert_eq!(months, vec![0, 3, 6, 9, 12, 15, 18, 21]);
        assert!(RebalanceFrequency::Annual.is_rebalance_month(12));
        assert!(!RebalanceFrequency::Annual.is_rebalance_month(6));
        assert!(RebalanceFrequency::None.is_rebalance_month(0));
        assert!(!RebalanceFrequency::None.is_rebalance_month(1));
        assert_eq!("Quarterly".parse::<RebalanceFrequency>().unwrap(), RebalanceFrequency::Quarterly);
        assert!("weekly".parse::<RebalanceFrequency>().is_err());
    }

    #[test]
    fn test_no_rebalancing_sets_weights_once() {
        let assumptions = Assumptions::default_forecast();
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&assumptions, &config);
        let optimizer = AllocationOptimizer::new(engine, OptimizerConfig::default()).unwrap();
        let strategy = PeriodOptimizer::new(&optimizer);

        let records = RebalancingEngine::new(engine)
            .run(&strategy, &ScenarioKey::base(), 3, RebalanceFrequency::None)
            .unwrap();

        assert_eq!(records.len(), 36);
        assert_eq!(records.iter().filter(|r| r.rebalanced).count(), 1);
        assert!(records[0].rebalanced);
        assert!(records.iter().all(|r| r.transaction_cost == 0.0));
        assert!(records.iter().all(|r| r.weights == records[0].weights));
    }

    #[test]
    fn test_history_snapshots_are_independent() {
        let assumptions = Assumptions::default_forecast();
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&assumptions, &config);
        let optimizer = AllocationOptimizer::new(engine, OptimizerConfig::default()).unwrap();
        let strategy = PeriodOptimizer::new(&optimizer);

        let records = RebalancingEngine::new(engine)
            .run(&strategy, &ScenarioKey::base(), 2, RebalanceFrequency::Annual)
            .unwrap();

        // Year 2 rates differ, so the second allocation differs from the first
        assert!(records[12].rebalanced);
        assert_ne!(records[0].weights, records[12].weights);
        assert_eq!(records[0].weights, records[11].weights);
        assert!(records[12].transaction_cost > 0.0);
    }

    #[test]
    fn test_free_rebalancing_never_loses_to_holding() {
        // Flat rates and FX: every period's optimum is the same allocation
        let mut scenarios = ScenarioTables::default_forecast();
        scenarios.rates.insert("flat", vec![12.0]).unwrap();
        scenarios.fx.insert("flat", vec![90.0]).unwrap();
        let assumptions = Assumptions::new(
            crate::instruments::InstrumentCatalog::default_catalog(),
            scenarios,
        );
        let config = SimulationConfig {
            transaction_cost_pct: 0.0,
            ..Default::default()
        };
        let engine = SimulationEngine::new(&assumptions, &config);
        let optimizer = AllocationOptimizer::new(engine, OptimizerConfig::default()).unwrap();
        let strategy = PeriodOptimizer::new(&optimizer);
        let rebalancer = RebalancingEngine::new(engine);
        let key = ScenarioKey::new("constant", "flat", "flat");

        let hold = rebalancer.run(&strategy, &key, 1, RebalanceFrequency::None).unwrap();
        let monthly = rebalancer.run(&strategy, &key, 1, RebalanceFrequency::Monthly).unwrap();

        let hold_end = hold.last().unwrap().capital;
        let monthly_end = monthly.last().unwrap().capital;
        assert!(monthly_end >= hold_end - 1e-6 * hold_end);
        assert!(monthly.iter().all(|r| r.transaction_cost == 0.0));
    }

    #[test]
    fn test_cost_is_deducted_before_the_step() {
        let assumptions = Assumptions::default_forecast();
        let key = ScenarioKey::base();
        let run = |config: &SimulationConfig| {
            let engine = SimulationEngine::new(&assumptions, config);
            let optimizer = AllocationOptimizer::new(engine, OptimizerConfig::default()).unwrap();
            RebalancingEngine::new(engine)
                .run(&PeriodOptimizer::new(&optimizer), &key, 2, RebalanceFrequency::Annual)
                .unwrap()
        };

        let free = run(&SimulationConfig {
            transaction_cost_pct: 0.0,
            ..Default::default()
        });
        let charged = run(&SimulationConfig::default());

        // Identical until the first paid rebalance
        assert_eq!(free[11].capital, charged[11].capital);
        assert_eq!(free[12].transaction_cost, 0.0);

        let cost = charged[12].transaction_cost;
        assert!(cost > 0.0);
        assert!(charged[12].capital < free[12].capital);
        // The charge earns no income during the month it is paid
        let growth = 1.0 + charged[12].return_pct / 100.0;
        assert_abs_diff_eq!(free[12].capital - charged[12].capital, cost * growth, epsilon = 1e-6);
    }

    #[test]
    fn test_transaction_cost_formula() {
        let assumptions = Assumptions::default_forecast();
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&assumptions, &config);
        let rebalancer = RebalancingEngine::new(engine);

        let a = WeightMapping::from_vector(&assumptions.catalog, &[0.5, 0.3, 0.2, 0.0]);
        let b = WeightMapping::from_vector(&assumptions.catalog, &[0.3, 0.5, 0.0, 0.2]);
        // 0.8 of 1,000,000 moved at 0.1%
        assert_abs_diff_eq!(rebalancer.transaction_cost(&a, &b, 1_000_000.0), 800.0, epsilon = 1e-6);
    }

    #[test]
    fn test_two_tier_through_rebalancer() {
        let assumptions = Assumptions::default_forecast();
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&assumptions, &config);
        let strategy = TwoTierStrategy::new(
            &assumptions.catalog,
            engine.yield_model(),
            TwoTierPolicy::default(),
        )
        .unwrap();

        let records = RebalancingEngine::new(engine)
            .run(&strategy, &ScenarioKey::base(), 3, RebalanceFrequency::Monthly)
            .unwrap();

        assert_eq!(records.len(), 36);
        for record in &records {
            assert_abs_diff_eq!(record.weights.weight("Bank Deposit CR-0.5"), 0.30, epsilon = 1e-12);
            assert!(record.weights.is_feasible(&assumptions.catalog));
        }
        let summary = RebalanceSummary::from_records(
            RebalanceFrequency::Monthly,
            &records,
            config.total_capital(),
        );
        assert_eq!(summary.rebalance_count, 36);
        assert!(summary.final_capital > config.total_capital());
    }
}
