//! Load the instrument catalog from instruments.csv and coupon_schedules.csv

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::Reader;

use super::{
    BoundCategory, Currency, Instrument, InstrumentCatalog, LiquidityTier, RateLinkage, RiskTier,
};
use crate::error::{ConfigError, Result};

/// Instrument file name inside an assumptions directory
pub const INSTRUMENTS_FILE: &str = "instruments.csv";

/// Coupon schedule file name inside an assumptions directory
pub const COUPON_SCHEDULES_FILE: &str = "coupon_schedules.csv";

/// Raw CSV row matching instruments.csv columns
#[derive(Debug, serde::Deserialize)]
struct InstrumentRow {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    annual_yield_pct: f64,
    duration: f64,
    risk_tier: String,
    tax_free: bool,
    currency: String,
    liquidity_tier: String,
    linkage: String,
    bound_category: Option<String>,
}

/// Raw CSV row matching coupon_schedules.csv columns
#[derive(Debug, serde::Deserialize)]
struct CouponRow {
    instrument: String,
    month: usize,
    coupon_pct: f64,
}

impl InstrumentRow {
    fn into_instrument(self) -> Result<Instrument> {
        let field = |suffix: &str| format!("{}.{}", self.name, suffix);

        let risk = match self.risk_tier.to_ascii_lowercase().as_str() {
            "low" => RiskTier::Low,
            "medium" => RiskTier::Medium,
            "high" => RiskTier::High,
            other => return Err(unknown_label(field("risk_tier"), other)),
        };

        let liquidity = match self.liquidity_tier.to_ascii_lowercase().as_str() {
            "low" => LiquidityTier::Low,
            "medium" => LiquidityTier::Medium,
            "high" => LiquidityTier::High,
            other => return Err(unknown_label(field("liquidity_tier"), other)),
        };

        let currency = match self.currency.to_ascii_lowercase().as_str() {
            "domestic" => Currency::Domestic,
            "foreign" => Currency::Foreign,
            other => return Err(unknown_label(field("currency"), other)),
        };

        let linkage = match self.linkage.to_ascii_lowercase().as_str() {
            "none" | "" => RateLinkage::None,
            "central" => RateLinkage::CentralRate,
            "overnight" => RateLinkage::OvernightRate,
            other => return Err(unknown_label(field("linkage"), other)),
        };

        let bound_category = match self.bound_category.as_deref().map(str::to_ascii_lowercase) {
            None => None,
            Some(label) => Some(match label.as_str() {
                "structured" => BoundCategory::Structured,
                "foreign" => BoundCategory::Foreign,
                "low_risk_domestic" => BoundCategory::LowRiskDomestic,
                "standard" => BoundCategory::Standard,
                other => return Err(unknown_label(field("bound_category"), other)),
            }),
        };

        let instrument = Instrument::new(
            self.name,
            self.kind,
            self.annual_yield_pct,
            self.duration,
            risk,
            liquidity,
            currency,
            self.tax_free,
            linkage,
        );

        Ok(match bound_category {
            Some(category) => instrument.with_bound_category(category),
            None => instrument,
        })
    }
}

fn unknown_label(field: String, label: &str) -> ConfigError {
    ConfigError::invalid_value(field, format!("unknown label '{}'", label))
}

/// Load instruments from any reader
pub fn load_instruments_from_reader<R: Read>(reader: R) -> Result<Vec<Instrument>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut instruments = Vec::new();

    for result in csv_reader.deserialize() {
        let row: InstrumentRow = result?;
        instruments.push(row.into_instrument()?);
    }

    Ok(instruments)
}

/// Load monthly coupon schedules keyed by instrument name.
/// Months are 1-indexed in the file and must be contiguous.
pub fn load_coupon_schedules_from_reader<R: Read>(reader: R) -> Result<HashMap<String, Vec<f64>>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows: HashMap<String, Vec<(usize, f64)>> = HashMap::new();

    for result in csv_reader.deserialize() {
        let row: CouponRow = result?;
        rows.entry(row.instrument)
            .or_default()
            .push((row.month, row.coupon_pct));
    }

    let mut schedules = HashMap::with_capacity(rows.len());
    for (name, mut months) in rows {
        months.sort_by_key(|(month, _)| *month);
        for (expected, (month, _)) in (1..).zip(months.iter()) {
            if *month != expected {
                return Err(ConfigError::invalid_value(
                    format!("{}.coupon_schedule", name),
                    format!("expected month {}, found {}", expected, month),
                ));
            }
        }
        schedules.insert(name, months.into_iter().map(|(_, c)| c).collect());
    }

    Ok(schedules)
}

/// Load the catalog from an assumptions directory.
/// The coupon file is optional; every schedule in it must name a catalog instrument.
pub fn load_catalog(path: &Path) -> Result<InstrumentCatalog> {
    let mut instruments = load_instruments_from_reader(std::fs::File::open(
        path.join(INSTRUMENTS_FILE),
    )?)?;

    let coupon_path = path.join(COUPON_SCHEDULES_FILE);
    if coupon_path.exists() {
        let schedules = load_coupon_schedules_from_reader(std::fs::File::open(coupon_path)?)?;
        attach_coupon_schedules(&mut instruments, schedules)?;
    }

    InstrumentCatalog::new(instruments)
}

fn attach_coupon_schedules(
    instruments: &mut [Instrument],
    schedules: HashMap<String, Vec<f64>>,
) -> Result<()> {
    for (name, coupons) in schedules {
        let instrument = instruments
            .iter_mut()
            .find(|i| i.name == name)
            .ok_or_else(|| ConfigError::unknown_instrument(&name))?;
        // An explicit bound category from the file wins over the structured default
        let derived = BoundCategory::classify(instrument.currency, instrument.risk, false);
        if instrument.bound_category == derived {
            instrument.bound_category = BoundCategory::Structured;
        }
        instrument.coupon_schedule = Some(coupons);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::DEFAULT_ASSUMPTIONS_PATH;

    const INSTRUMENTS: &str = "\
name,type,annual_yield_pct,duration,risk_tier,tax_free,currency,liquidity_tier,linkage,bound_category
Deposit,Deposit,16.0,1.0,low,false,domestic,low,central,
Fund,Fund,15.5,0.0,low,true,domestic,high,overnight,
Cash,Currency,0.1,0.0,low,true,foreign,high,none,
";

    #[test]
    fn test_load_instruments_from_reader() {
        let instruments = load_instruments_from_reader(INSTRUMENTS.as_bytes()).unwrap();
        assert_eq!(instruments.len(), 3);
        assert_eq!(instruments[0].linkage, RateLinkage::CentralRate);
        assert!(instruments[1].tax_exempt);
        assert_eq!(instruments[2].bound_category, BoundCategory::Foreign);
    }

    #[test]
    fn test_unknown_label_is_config_error() {
        let data = "\
name,type,annual_yield_pct,duration,risk_tier,tax_free,currency,liquidity_tier,linkage,bound_category
Deposit,Deposit,16.0,1.0,extreme,false,domestic,low,central,
";
        let err = load_instruments_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_coupon_schedule_gap_rejected() {
        let data = "instrument,month,coupon_pct\nNote,1,1.0\nNote,3,1.2\n";
        let err = load_coupon_schedules_from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected month 2"));
    }

    #[test]
    fn test_load_default_catalog() {
        let catalog = load_catalog(Path::new(DEFAULT_ASSUMPTIONS_PATH))
            .expect("Failed to load catalog");
        assert_eq!(catalog.len(), 4);

        let note = catalog.get("Structured Note").unwrap();
        assert!(note.has_variable_coupon());
        assert_eq!(note.bound_category, BoundCategory::Structured);
        assert_eq!(note.coupon_schedule.as_ref().map(Vec::len), Some(12));
    }
}
