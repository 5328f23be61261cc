//! Income Allocator - Income-targeted portfolio allocation under rate and FX scenarios
//!
//! This library provides:
//! - An instrument catalog with allocation caps and variable-coupon schedules
//! - Named rate, FX and capital-growth scenario tables (in-memory or CSV)
//! - After-tax, rate-linked and FX-revaluation yield modeling
//! - Annual and monthly portfolio simulation
//! - Constrained weight optimization (income coverage or total income)
//! - Periodic rebalancing with transaction costs and a two-tier strategy
//! - Parallel scenario comparison

pub mod error;
pub mod instruments;
pub mod assumptions;
pub mod projection;
pub mod optimizer;
pub mod strategy;
pub mod scenario;

// Re-export commonly used types
pub use error::{ConfigError, Result};
pub use instruments::{Instrument, InstrumentCatalog};
pub use assumptions::{Assumptions, ScenarioKey, ScenarioTables};
pub use projection::{SimulationConfig, SimulationEngine, SimulationRecord, SimulationSummary, YieldModel};
pub use optimizer::{AllocationOptimizer, AllocationResult, OptimizerConfig, WeightMapping};
pub use strategy::{AllocationStrategy, RebalanceFrequency, RebalancingEngine, StrategyKind, TwoTierStrategy};
pub use scenario::ScenarioRunner;
