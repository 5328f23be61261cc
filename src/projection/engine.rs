//! Annual and monthly portfolio simulation

use log::debug;

use super::breakdown::{AllocationBreakdown, AllocationLine};
use super::config::SimulationConfig;
use super::records::SimulationRecord;
use super::state::PortfolioState;
use super::yields::YieldModel;
use crate::assumptions::{Assumptions, ResolvedScenario, ScenarioKey};
use crate::error::Result;
use crate::instruments::{Instrument, InstrumentCatalog};
use crate::optimizer::WeightMapping;

/// Simulation engine over borrowed, immutable assumptions
#[derive(Debug, Clone, Copy)]
pub struct SimulationEngine<'a> {
    assumptions: &'a Assumptions,
    config: &'a SimulationConfig,
    model: YieldModel,
}

impl<'a> SimulationEngine<'a> {
    pub fn new(assumptions: &'a Assumptions, config: &'a SimulationConfig) -> Self {
        Self {
            assumptions,
            config,
            model: config.yield_model(),
        }
    }

    pub fn assumptions(&self) -> &'a Assumptions {
        self.assumptions
    }

    pub fn catalog(&self) -> &'a InstrumentCatalog {
        &self.assumptions.catalog
    }

    pub fn config(&self) -> &'a SimulationConfig {
        self.config
    }

    pub fn yield_model(&self) -> YieldModel {
        self.model
    }

    pub fn resolve(&self, key: &ScenarioKey) -> Result<ResolvedScenario<'a>> {
        self.assumptions.scenarios.resolve(key)
    }

    /// State at the start of every simulation
    pub fn initial_state(&self) -> PortfolioState {
        PortfolioState::new(self.config.total_capital(), self.config.initial_foreign_share())
    }

    /// Year-by-year simulation of fixed weights
    pub fn simulate_annual(
        &self,
        weights: &WeightMapping,
        key: &ScenarioKey,
        years: usize,
    ) -> Result<Vec<SimulationRecord>> {
        let weights = weights.to_vector(self.catalog())?;
        let scenario = self.resolve(key)?;
        Ok(self.simulate_annual_resolved(&weights, &scenario, years))
    }

    /// Month-by-month simulation of fixed weights
    pub fn simulate_monthly(
        &self,
        weights: &WeightMapping,
        key: &ScenarioKey,
        months: usize,
    ) -> Result<Vec<SimulationRecord>> {
        let weights = weights.to_vector(self.catalog())?;
        let scenario = self.resolve(key)?;

        let mut state = self.initial_state();
        Ok((0..months)
            .map(|_| self.step_month(&mut state, &weights, &scenario))
            .collect())
    }

    /// Annual simulation on catalog-ordered weights; used by the optimizer objective
    pub fn simulate_annual_resolved(
        &self,
        weights: &[f64],
        scenario: &ResolvedScenario<'_>,
        years: usize,
    ) -> Vec<SimulationRecord> {
        let mut state = self.initial_state();
        (0..years)
            .map(|_| self.step_year(&mut state, weights, scenario))
            .collect()
    }

    /// Portfolio yield (fraction) for a 0-indexed year
    pub fn portfolio_yield_for_year(
        &self,
        weights: &[f64],
        year: usize,
        scenario: &ResolvedScenario<'_>,
    ) -> f64 {
        self.weighted_yield(weights, |instrument| {
            self.model.year_yield(instrument, year, scenario)
        })
    }

    /// Annualized portfolio yield (fraction) for a 0-indexed month
    pub fn portfolio_yield_for_month(
        &self,
        weights: &[f64],
        month: usize,
        scenario: &ResolvedScenario<'_>,
    ) -> f64 {
        self.weighted_yield(weights, |instrument| {
            self.model.month_yield(instrument, month, scenario)
        })
    }

    fn weighted_yield<F>(&self, weights: &[f64], yield_pct: F) -> f64
    where
        F: Fn(&Instrument) -> f64,
    {
        self.catalog()
            .iter()
            .zip(weights)
            .filter(|(_, &w)| w > self.config.weight_threshold)
            .map(|(instrument, &w)| w * yield_pct(instrument) / 100.0)
            .sum()
    }

    /// Advance one year: income, scenario growth, capital floor
    pub fn step_year(
        &self,
        state: &mut PortfolioState,
        weights: &[f64],
        scenario: &ResolvedScenario<'_>,
    ) -> SimulationRecord {
        let year = state.period;
        let capital_start = state.capital;
        let portfolio_yield = self.portfolio_yield_for_year(weights, year, scenario);

        let income = capital_start * portfolio_yield;
        let growth_delta = capital_start * scenario.capital_growth.annual_rate;
        let capital_end = (capital_start + income + growth_delta).max(0.0);

        state.advance(capital_end);

        SimulationRecord {
            period: year + 1,
            year: year + 1,
            capital_start,
            portfolio_yield_pct: portfolio_yield * 100.0,
            income,
            monthly_income: income / 12.0,
            growth_delta,
            capital_end,
            foreign_share_pct: state.foreign_share * 100.0,
        }
    }

    /// Advance one month at a twelfth of the annualized yield and growth rate
    pub fn step_month(
        &self,
        state: &mut PortfolioState,
        weights: &[f64],
        scenario: &ResolvedScenario<'_>,
    ) -> SimulationRecord {
        let month = state.period;
        let capital_start = state.capital;
        let portfolio_yield = self.portfolio_yield_for_month(weights, month, scenario);

        let income = capital_start * portfolio_yield / 12.0;
        let growth_delta = capital_start * scenario.capital_growth.monthly_rate();
        let capital_end = (capital_start + income + growth_delta).max(0.0);

        state.advance(capital_end);

        SimulationRecord {
            period: month + 1,
            year: month / 12 + 1,
            capital_start,
            portfolio_yield_pct: portfolio_yield * 100.0,
            income,
            monthly_income: income,
            growth_delta,
            capital_end,
            foreign_share_pct: state.foreign_share * 100.0,
        }
    }

    /// Capital and year-0 income per instrument for a given allocation
    pub fn allocation_breakdown(
        &self,
        weights: &WeightMapping,
        key: &ScenarioKey,
    ) -> Result<AllocationBreakdown> {
        let vector = weights.to_vector(self.catalog())?;
        let scenario = self.resolve(key)?;
        let capital = self.config.total_capital();
        let spot = self.config.spot_fx_rate;

        let lines: Vec<AllocationLine> = self
            .catalog()
            .iter()
            .zip(&vector)
            .filter(|(_, &w)| w > self.config.weight_threshold)
            .map(|(instrument, &weight)| {
                let amount = capital * weight;
                let base_yield_pct = instrument.base_yield_for_year(0);
                let after_tax_yield_pct = self.model.year_yield(instrument, 0, &scenario);
                let annual_income = amount * after_tax_yield_pct / 100.0;
                AllocationLine {
                    instrument: instrument.name.clone(),
                    kind: instrument.kind.clone(),
                    currency: instrument.currency,
                    weight,
                    amount,
                    foreign_amount: instrument.is_foreign().then(|| amount / spot),
                    base_yield_pct,
                    after_tax_yield_pct,
                    annual_income,
                    monthly_income: annual_income / 12.0,
                }
            })
            .collect();

        debug!("Breakdown for {}: {} active instruments", key, lines.len());
        Ok(AllocationBreakdown::new(
            lines,
            self.config.target_monthly_income,
        ))
    }
}
