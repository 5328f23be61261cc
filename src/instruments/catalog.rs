//! Immutable instrument catalog

use std::collections::HashSet;

use super::data::{Currency, Instrument, LiquidityTier, RateLinkage, RiskTier};
use crate::error::{ConfigError, Result};

/// Monthly coupon forecast of the default structured note (% per month)
pub const DEFAULT_STRUCTURED_COUPONS: [f64; 12] = [
    1.01, 1.45, 1.55, 1.27, 1.43, 1.11, 0.96, 1.25, 1.49, 1.23, 1.24, 1.00,
];

/// Ordered, validated set of instruments.
///
/// Order is significant: optimizer weight vectors are aligned with it.
#[derive(Debug, Clone)]
pub struct InstrumentCatalog {
    instruments: Vec<Instrument>,
}

impl InstrumentCatalog {
    /// Build a catalog, rejecting empty input, duplicate names and bad numbers
    pub fn new(instruments: Vec<Instrument>) -> Result<Self> {
        if instruments.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for instrument in &instruments {
            if !seen.insert(instrument.name.as_str()) {
                return Err(ConfigError::DuplicateInstrument {
                    name: instrument.name.clone(),
                });
            }
            validate_instrument(instrument)?;
        }

        let capacity: f64 = instruments.iter().map(|i| i.max_weight()).sum();
        if capacity < 1.0 - 1e-9 {
            return Err(ConfigError::InfeasibleBounds { capacity });
        }

        Ok(Self { instruments })
    }

    /// Default catalog: rate-linked deposit, overnight-linked money-market fund,
    /// variable-coupon structured note and foreign cash
    pub fn default_catalog() -> Self {
        Self {
            instruments: vec![
                Instrument::new(
                    "Bank Deposit CR-0.5",
                    "Deposit",
                    16.0,
                    1.0,
                    RiskTier::Low,
                    LiquidityTier::Low,
                    Currency::Domestic,
                    false,
                    RateLinkage::CentralRate,
                ),
                Instrument::new(
                    "Money Market Fund",
                    "Exchange-traded fund",
                    15.5,
                    0.0,
                    RiskTier::Low,
                    LiquidityTier::High,
                    Currency::Domestic,
                    true,
                    RateLinkage::OvernightRate,
                ),
                Instrument::new(
                    "Structured Note",
                    "Structured bond",
                    15.0,
                    3.27,
                    RiskTier::Medium,
                    LiquidityTier::Medium,
                    Currency::Domestic,
                    false,
                    RateLinkage::None,
                )
                .with_coupon_schedule(DEFAULT_STRUCTURED_COUPONS.to_vec()),
                Instrument::new(
                    "Foreign Cash",
                    "Currency",
                    0.1,
                    0.0,
                    RiskTier::Low,
                    LiquidityTier::High,
                    Currency::Foreign,
                    true,
                    RateLinkage::None,
                ),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Look up an instrument by name
    pub fn get(&self, name: &str) -> Result<&Instrument> {
        self.instruments
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| ConfigError::unknown_instrument(name))
    }

    /// Position of an instrument in catalog order
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.instruments
            .iter()
            .position(|i| i.name == name)
            .ok_or_else(|| ConfigError::unknown_instrument(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.name.as_str()).collect()
    }

    /// Upper weight bounds in catalog order
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.instruments.iter().map(|i| i.max_weight()).collect()
    }
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}

fn validate_instrument(instrument: &Instrument) -> Result<()> {
    let field = |suffix: &str| format!("{}.{}", instrument.name, suffix);

    if instrument.name.trim().is_empty() {
        return Err(ConfigError::invalid_config("instrument with empty name"));
    }
    if !instrument.annual_yield_pct.is_finite() {
        return Err(ConfigError::invalid_value(
            field("annual_yield_pct"),
            "must be finite",
        ));
    }
    if !instrument.duration_years.is_finite() || instrument.duration_years < 0.0 {
        return Err(ConfigError::invalid_value(
            field("duration_years"),
            "must be finite and non-negative",
        ));
    }
    if let Some(coupons) = &instrument.coupon_schedule {
        if coupons.is_empty() {
            return Err(ConfigError::invalid_value(
                field("coupon_schedule"),
                "must contain at least one month",
            ));
        }
        if coupons.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::invalid_value(
                field("coupon_schedule"),
                "coupons must be finite",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::BoundCategory;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = InstrumentCatalog::default_catalog();
        let rebuilt = InstrumentCatalog::new(catalog.instruments().to_vec());
        assert!(rebuilt.is_ok());
        assert_eq!(catalog.len(), 4);

        let note = catalog.get("Structured Note").unwrap();
        assert_eq!(note.bound_category, BoundCategory::Structured);
        assert_eq!(catalog.index_of("Foreign Cash").unwrap(), 3);
        assert_eq!(catalog.upper_bounds(), vec![0.5, 0.5, 0.2, 0.4]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let catalog = InstrumentCatalog::default_catalog();
        let mut instruments = catalog.instruments().to_vec();
        instruments.push(instruments[0].clone());

        let err = InstrumentCatalog::new(instruments).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateInstrument { .. }));
    }

    #[test]
    fn test_infeasible_bounds_rejected() {
        let catalog = InstrumentCatalog::default_catalog();
        // 0.2 + 0.4 < 1: cannot be fully invested
        let instruments = vec![
            catalog.instruments()[2].clone(),
            catalog.instruments()[3].clone(),
        ];

        let err = InstrumentCatalog::new(instruments).unwrap_err();
        assert!(matches!(err, ConfigError::InfeasibleBounds { .. }));
    }

    #[test]
    fn test_unknown_instrument() {
        let catalog = InstrumentCatalog::default_catalog();
        assert!(matches!(
            catalog.get("Gold"),
            Err(ConfigError::UnknownInstrument { .. })
        ));
    }
}
