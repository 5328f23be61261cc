//! Instrument data structures matching the catalog format

use serde::{Deserialize, Serialize};

/// Maximum weight for structured / variable-coupon instruments
pub const STRUCTURED_MAX_WEIGHT: f64 = 0.20;

/// Maximum weight for foreign-currency instruments
pub const FOREIGN_MAX_WEIGHT: f64 = 0.40;

/// Maximum weight for low-risk domestic instruments
pub const LOW_RISK_DOMESTIC_MAX_WEIGHT: f64 = 0.50;

/// Maximum weight for everything else
pub const STANDARD_MAX_WEIGHT: f64 = 0.40;

/// Currency the instrument is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// Reporting currency, no FX effect
    Domestic,
    /// Foreign currency, yield picks up the FX move of each period
    Foreign,
}

impl Currency {
    pub fn is_foreign(&self) -> bool {
        matches!(self, Currency::Foreign)
    }
}

/// Risk tier of the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Liquidity tier of the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityTier {
    Low,
    Medium,
    High,
}

/// How the instrument's yield follows the central-bank rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLinkage {
    /// Fixed catalog yield
    None,
    /// Central rate minus 0.5
    CentralRate,
    /// Overnight proxy: central rate minus 1.0
    OvernightRate,
}

/// Rule set determining the maximum portfolio weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundCategory {
    /// Structured / variable-coupon notes (20%)
    Structured,
    /// Foreign-currency holdings (40%)
    Foreign,
    /// Low-risk domestic instruments (50%)
    LowRiskDomestic,
    /// Everything else (40%)
    Standard,
}

impl BoundCategory {
    /// Upper weight bound for this category
    pub fn max_weight(&self) -> f64 {
        match self {
            BoundCategory::Structured => STRUCTURED_MAX_WEIGHT,
            BoundCategory::Foreign => FOREIGN_MAX_WEIGHT,
            BoundCategory::LowRiskDomestic => LOW_RISK_DOMESTIC_MAX_WEIGHT,
            BoundCategory::Standard => STANDARD_MAX_WEIGHT,
        }
    }

    /// Derive the category from instrument attributes when none is given.
    /// Precedence: variable coupon, then currency, then risk.
    pub fn classify(currency: Currency, risk: RiskTier, variable_coupon: bool) -> Self {
        if variable_coupon {
            BoundCategory::Structured
        } else if currency.is_foreign() {
            BoundCategory::Foreign
        } else if risk == RiskTier::Low {
            BoundCategory::LowRiskDomestic
        } else {
            BoundCategory::Standard
        }
    }
}

/// A single instrument in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique instrument name
    pub name: String,

    /// Category/type label (deposit, fund, bond, cash...)
    pub kind: String,

    /// Base annual yield in percent
    pub annual_yield_pct: f64,

    /// Duration in years
    pub duration_years: f64,

    pub risk: RiskTier,

    pub liquidity: LiquidityTier,

    pub currency: Currency,

    /// Yield not reduced by the income tax rate
    pub tax_exempt: bool,

    pub linkage: RateLinkage,

    pub bound_category: BoundCategory,

    /// Monthly coupon forecast in percent per month (variable-coupon instruments only)
    pub coupon_schedule: Option<Vec<f64>>,
}

impl Instrument {
    /// Create a fixed-coupon instrument; bound category is derived from its attributes
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        annual_yield_pct: f64,
        duration_years: f64,
        risk: RiskTier,
        liquidity: LiquidityTier,
        currency: Currency,
        tax_exempt: bool,
        linkage: RateLinkage,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            annual_yield_pct,
            duration_years,
            risk,
            liquidity,
            currency,
            tax_exempt,
            linkage,
            bound_category: BoundCategory::classify(currency, risk, false),
            coupon_schedule: None,
        }
    }

    /// Attach a monthly coupon forecast; the instrument becomes structured
    pub fn with_coupon_schedule(mut self, coupons: Vec<f64>) -> Self {
        self.coupon_schedule = Some(coupons);
        self.bound_category = BoundCategory::Structured;
        self
    }

    /// Override the derived bound category
    pub fn with_bound_category(mut self, category: BoundCategory) -> Self {
        self.bound_category = category;
        self
    }

    pub fn is_foreign(&self) -> bool {
        self.currency.is_foreign()
    }

    pub fn has_variable_coupon(&self) -> bool {
        self.coupon_schedule.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Maximum portfolio weight
    pub fn max_weight(&self) -> f64 {
        self.bound_category.max_weight()
    }

    /// Coupon for a 0-indexed month, None past the end of the schedule
    pub fn coupon_for_month(&self, month: usize) -> Option<f64> {
        self.coupon_schedule.as_ref().and_then(|c| c.get(month).copied())
    }

    /// Base annual yield (%) in force during a 0-indexed month.
    /// Scheduled coupons are annualized; past the schedule the catalog yield applies.
    pub fn base_yield_for_month(&self, month: usize) -> f64 {
        match self.coupon_for_month(month) {
            Some(coupon) => coupon * 12.0,
            None => self.annual_yield_pct,
        }
    }

    /// Base annual yield (%) for a 0-indexed year: mean of its twelve monthly yields
    pub fn base_yield_for_year(&self, year: usize) -> f64 {
        if !self.has_variable_coupon() {
            return self.annual_yield_pct;
        }
        let first = year * 12;
        (first..first + 12)
            .map(|m| self.base_yield_for_month(m))
            .sum::<f64>()
            / 12.0
    }
}
