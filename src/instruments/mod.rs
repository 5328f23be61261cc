//! Instrument data structures and catalog loading

mod catalog;
mod coupons;
mod data;
pub mod loader;

pub use catalog::{InstrumentCatalog, DEFAULT_STRUCTURED_COUPONS};
pub use coupons::{
    catalog_coupon_payments, coupon_payments, coupon_stats, CouponPayment, CouponStats,
};
pub use data::{
    BoundCategory, Currency, Instrument, LiquidityTier, RateLinkage, RiskTier,
    FOREIGN_MAX_WEIGHT, LOW_RISK_DOMESTIC_MAX_WEIGHT, STANDARD_MAX_WEIGHT, STRUCTURED_MAX_WEIGHT,
};
pub use loader::load_catalog;
