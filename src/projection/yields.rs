//! After-tax, after-FX instrument yields
//!
//! Adjustment order for one instrument and year:
//! 1. Rate-linked instruments replace the base yield with the scenario's central
//!    rate minus a fixed spread
//! 2. Taxable instruments keep `1 - tax_rate` of the yield
//! 3. Foreign instruments add the FX gain of that single year, net of the
//!    bid/ask spread on both conversions
//! 4. The result is floored at zero

use crate::assumptions::{ResolvedScenario, ScenarioSeries};
use crate::instruments::{Instrument, RateLinkage};

/// Central-rate-linked yield: central rate minus this (percentage points)
pub const CENTRAL_RATE_SPREAD: f64 = 0.5;

/// Overnight proxy: central rate minus this (percentage points)
pub const OVERNIGHT_RATE_SPREAD: f64 = 1.0;

pub const DEFAULT_TAX_RATE: f64 = 0.13;

pub const DEFAULT_FX_SPREAD_PCT: f64 = 0.5;

/// Yield adjustments; stateless apart from its two parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldModel {
    /// Tax on taxable instruments (fraction)
    pub tax_rate: f64,

    /// Bid/ask spread on currency conversion (percent of rate)
    pub fx_spread_pct: f64,
}

impl Default for YieldModel {
    fn default() -> Self {
        Self::new(DEFAULT_TAX_RATE, DEFAULT_FX_SPREAD_PCT)
    }
}

impl YieldModel {
    pub fn new(tax_rate: f64, fx_spread_pct: f64) -> Self {
        Self {
            tax_rate,
            fx_spread_pct,
        }
    }

    /// After-tax, after-FX annual yield in percent for a 0-indexed year
    pub fn after_tax_yield(
        &self,
        instrument: &Instrument,
        base_yield: f64,
        year: usize,
        scenario: &ResolvedScenario<'_>,
    ) -> f64 {
        let base_yield = match instrument.linkage {
            RateLinkage::None => base_yield,
            RateLinkage::CentralRate => scenario.rates.at(year) - CENTRAL_RATE_SPREAD,
            RateLinkage::OvernightRate => scenario.rates.at(year) - OVERNIGHT_RATE_SPREAD,
        };

        let mut adjusted = if instrument.tax_exempt {
            base_yield
        } else {
            base_yield * (1.0 - self.tax_rate)
        };

        if instrument.is_foreign() {
            adjusted += self.fx_gain_pct(scenario.fx, year);
        }

        adjusted.max(0.0)
    }

    /// Yield for a whole year, using the instrument's own base yield
    pub fn year_yield(
        &self,
        instrument: &Instrument,
        year: usize,
        scenario: &ResolvedScenario<'_>,
    ) -> f64 {
        self.after_tax_yield(instrument, instrument.base_yield_for_year(year), year, scenario)
    }

    /// Annualized yield in force during a 0-indexed month
    pub fn month_yield(
        &self,
        instrument: &Instrument,
        month: usize,
        scenario: &ResolvedScenario<'_>,
    ) -> f64 {
        self.after_tax_yield(
            instrument,
            instrument.base_yield_for_month(month),
            month / 12,
            scenario,
        )
    }

    /// FX gain (%) of holding foreign currency through one year
    pub fn fx_gain_pct(&self, fx: &ScenarioSeries, year: usize) -> f64 {
        fx_period_gain(fx.at(year), fx.at(year + 1), self.fx_spread_pct)
    }
}

/// Gain (%) from buying at `start` and selling at `end` with a symmetric spread
pub fn fx_period_gain(start: f64, end: f64, spread_pct: f64) -> f64 {
    let buy = start * (1.0 + spread_pct / 200.0);
    let sell = end * (1.0 - spread_pct / 200.0);
    (sell - buy) / buy * 100.0
}
