//! Yield model and portfolio simulation over annual and monthly periods

mod breakdown;
mod config;
mod engine;
mod records;
mod state;
mod yields;

pub use breakdown::{AllocationBreakdown, AllocationLine};
pub use config::{SimulationConfig, DEFAULT_WEIGHT_THRESHOLD};
pub use engine::SimulationEngine;
pub use records::{SimulationRecord, SimulationSummary, SustainabilityVerdict};
pub use state::PortfolioState;
pub use yields::{
    fx_period_gain, YieldModel, CENTRAL_RATE_SPREAD, DEFAULT_FX_SPREAD_PCT, DEFAULT_TAX_RATE,
    OVERNIGHT_RATE_SPREAD,
};
