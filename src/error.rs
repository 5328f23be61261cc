//! Configuration error type shared by every module
//!
//! Only malformed or missing catalog/scenario data is reported as an error.
//! Solver non-convergence travels inside the result payload instead.

use std::fmt;

use thiserror::Error;

/// Result type alias for allocation operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Which scenario table a lookup went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Rate,
    Fx,
    CapitalGrowth,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScenarioKind::Rate => "rate",
            ScenarioKind::Fx => "FX",
            ScenarioKind::CapitalGrowth => "capital-growth",
        };
        f.write_str(label)
    }
}

/// Malformed or missing instrument/scenario data
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Name not present in the instrument catalog
    #[error("Unknown instrument: {name}")]
    UnknownInstrument { name: String },

    /// Two catalog entries share a name
    #[error("Duplicate instrument: {name}")]
    DuplicateInstrument { name: String },

    /// Catalog has no instruments
    #[error("Instrument catalog is empty")]
    EmptyCatalog,

    /// Scenario name not present in its table
    #[error("Unknown {kind} scenario: {name}")]
    UnknownScenario { kind: ScenarioKind, name: String },

    /// Scenario exists but has no values
    #[error("Empty {kind} scenario: {name}")]
    EmptyScenario { kind: ScenarioKind, name: String },

    /// Upper bounds cannot add up to a fully invested portfolio
    #[error("Infeasible weight bounds: upper bounds sum to {capacity:.4}, need at least 1")]
    InfeasibleBounds { capacity: f64 },

    /// A numeric field is non-finite or out of range
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Anything else wrong with the supplied configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn unknown_instrument(name: impl Into<String>) -> Self {
        Self::UnknownInstrument { name: name.into() }
    }

    pub fn unknown_scenario(kind: ScenarioKind, name: impl Into<String>) -> Self {
        Self::UnknownScenario {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::unknown_scenario(ScenarioKind::Fx, "crash");
        assert_eq!(err.to_string(), "Unknown FX scenario: crash");

        let err = ConfigError::InfeasibleBounds { capacity: 0.8 };
        assert!(err.to_string().contains("0.8000"));
    }
}
