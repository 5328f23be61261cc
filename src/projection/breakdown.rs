//! Per-instrument capital and income for an allocation

use serde::Serialize;

use crate::instruments::Currency;

/// One instrument's share of the portfolio
#[derive(Debug, Clone, Serialize)]
pub struct AllocationLine {
    pub instrument: String,
    pub kind: String,
    pub currency: Currency,
    pub weight: f64,

    /// Capital in domestic units
    pub amount: f64,

    /// Capital in foreign units, foreign instruments only
    pub foreign_amount: Option<f64>,

    pub base_yield_pct: f64,
    pub after_tax_yield_pct: f64,
    pub annual_income: f64,
    pub monthly_income: f64,
}

/// Allocation split into domestic and foreign holdings with first-year income
#[derive(Debug, Clone, Serialize)]
pub struct AllocationBreakdown {
    pub lines: Vec<AllocationLine>,
    pub domestic_total: f64,
    pub foreign_total: f64,
    pub annual_income: f64,
    pub monthly_income: f64,
    pub coverage: f64,
}

impl AllocationBreakdown {
    pub fn new(lines: Vec<AllocationLine>, target_monthly_income: f64) -> Self {
        let (foreign, domestic): (Vec<&AllocationLine>, Vec<&AllocationLine>) =
            lines.iter().partition(|l| l.currency.is_foreign());
        let domestic_total = domestic.iter().map(|l| l.amount).sum();
        let foreign_total = foreign.iter().map(|l| l.amount).sum();
        let annual_income: f64 = lines.iter().map(|l| l.annual_income).sum();
        let monthly_income = annual_income / 12.0;

        Self {
            domestic_total,
            foreign_total,
            annual_income,
            monthly_income,
            coverage: monthly_income / target_monthly_income,
            lines,
        }
    }

    /// Lines for domestic or foreign instruments
    pub fn lines_in(&self, currency: Currency) -> impl Iterator<Item = &AllocationLine> {
        self.lines.iter().filter(move |l| l.currency == currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{Assumptions, ScenarioKey};
    use crate::optimizer::WeightMapping;
    use crate::projection::{SimulationConfig, SimulationEngine};
    use approx::assert_relative_eq;

    #[test]
    fn test_breakdown_totals() {
        let assumptions = Assumptions::default_forecast();
        let config = SimulationConfig::default();
        let engine = SimulationEngine::new(&assumptions, &config);
        let weights = WeightMapping::from_vector(&assumptions.catalog, &[0.5, 0.3, 0.0, 0.2]);

        let breakdown = engine.allocation_breakdown(&weights, &ScenarioKey::base()).unwrap();

        // Zero weight is left out
        assert_eq!(breakdown.lines.len(), 3);
        assert_relative_eq!(
            breakdown.domestic_total + breakdown.foreign_total,
            config.total_capital(),
            epsilon = 1e-6
        );

        let cash = breakdown.lines_in(Currency::Foreign).next().unwrap();
        assert_relative_eq!(
            cash.foreign_amount.unwrap(),
            config.total_capital() * 0.2 / config.spot_fx_rate,
            epsilon = 1e-9
        );
        assert_eq!(breakdown.lines_in(Currency::Domestic).count(), 2);
        assert_relative_eq!(
            breakdown.coverage,
            breakdown.monthly_income / config.target_monthly_income
        );
    }
}
