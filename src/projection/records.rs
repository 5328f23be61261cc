//! Simulation output structures

use serde::{Deserialize, Serialize};

/// One period (year or month) of a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// 1-indexed period number
    pub period: usize,

    /// 1-indexed year the period falls in
    pub year: usize,

    pub capital_start: f64,

    /// Portfolio yield for the period, annualized percent
    pub portfolio_yield_pct: f64,

    /// Income earned during the period
    pub income: f64,

    /// Income per month during the period
    pub monthly_income: f64,

    /// Capital change from the growth scenario
    pub growth_delta: f64,

    pub capital_end: f64,

    /// Foreign-currency share of capital, percent
    pub foreign_share_pct: f64,
}

impl SimulationRecord {
    /// Monthly income relative to a target
    pub fn coverage(&self, target_monthly_income: f64) -> f64 {
        self.monthly_income / target_monthly_income
    }
}

/// Whether a simulated strategy meets the income target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SustainabilityVerdict {
    /// Income covers the target and capital is preserved
    Sustainable,
    /// Income covers the target but capital declines
    IncomeOnly,
    /// Income falls short of the target
    Insufficient,
}

/// Aggregate metrics over a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub periods: usize,
    pub average_yield_pct: f64,
    pub average_monthly_income: f64,
    pub total_income: f64,
    pub starting_capital: f64,
    pub ending_capital: f64,
    /// Mean of monthly income / target
    pub average_coverage: f64,
    pub capital_change_pct: f64,
    pub verdict: SustainabilityVerdict,
}

impl SimulationSummary {
    pub fn from_records(records: &[SimulationRecord], target_monthly_income: f64) -> Self {
        let periods = records.len();
        let n = periods.max(1) as f64;

        let starting_capital = records.first().map_or(0.0, |r| r.capital_start);
        let ending_capital = records.last().map_or(starting_capital, |r| r.capital_end);
        let average_monthly_income = records.iter().map(|r| r.monthly_income).sum::<f64>() / n;
        let average_coverage = average_monthly_income / target_monthly_income;

        let capital_change_pct = if starting_capital > 0.0 {
            (ending_capital - starting_capital) / starting_capital * 100.0
        } else {
            0.0
        };

        let verdict = if average_coverage >= 1.0 && capital_change_pct >= 0.0 {
            SustainabilityVerdict::Sustainable
        } else if average_coverage >= 1.0 {
            SustainabilityVerdict::IncomeOnly
        } else {
            SustainabilityVerdict::Insufficient
        };

        Self {
            periods,
            average_yield_pct: records.iter().map(|r| r.portfolio_yield_pct).sum::<f64>() / n,
            average_monthly_income,
            total_income: records.iter().map(|r| r.income).sum(),
            starting_capital,
            ending_capital,
            average_coverage,
            capital_change_pct,
            verdict,
        }
    }
}
