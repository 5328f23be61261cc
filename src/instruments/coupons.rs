//! Coupon schedule analytics for variable-coupon instruments

use serde::Serialize;

use super::{Instrument, InstrumentCatalog};

/// Summary statistics of a monthly coupon schedule (% per month)
#[derive(Debug, Clone, Serialize)]
pub struct CouponStats {
    pub months: usize,
    pub average_pct: f64,
    pub min_pct: f64,
    pub max_pct: f64,
    /// Sum of all monthly coupons
    pub total_pct: f64,
}

/// One month of coupon payments on an invested amount
#[derive(Debug, Clone, Serialize)]
pub struct CouponPayment {
    pub instrument: String,
    /// 1-indexed month
    pub month: usize,
    pub coupon_pct: f64,
    pub gross: f64,
    pub tax: f64,
    pub net: f64,
    pub cumulative_net: f64,
}

/// Statistics for the instrument's schedule, None for fixed-coupon instruments
pub fn coupon_stats(instrument: &Instrument) -> Option<CouponStats> {
    let coupons = instrument.coupon_schedule.as_ref().filter(|c| !c.is_empty())?;

    let total_pct: f64 = coupons.iter().sum();
    let min_pct = coupons.iter().copied().fold(f64::INFINITY, f64::min);
    let max_pct = coupons.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(CouponStats {
        months: coupons.len(),
        average_pct: total_pct / coupons.len() as f64,
        min_pct,
        max_pct,
        total_pct,
    })
}

/// Month-by-month payments on `investment`. Tax-exempt instruments pay no tax.
pub fn coupon_payments(instrument: &Instrument, investment: f64, tax_rate: f64) -> Vec<CouponPayment> {
    let Some(coupons) = instrument.coupon_schedule.as_ref() else {
        return Vec::new();
    };
    let tax_rate = if instrument.tax_exempt { 0.0 } else { tax_rate };

    let mut cumulative_net = 0.0;
    coupons
        .iter()
        .enumerate()
        .map(|(idx, &coupon_pct)| {
            let gross = investment * coupon_pct / 100.0;
            let tax = gross * tax_rate;
            let net = gross - tax;
            cumulative_net += net;
            CouponPayment {
                instrument: instrument.name.clone(),
                month: idx + 1,
                coupon_pct,
                gross,
                tax,
                net,
                cumulative_net,
            }
        })
        .collect()
}

/// Payments of every variable-coupon instrument in the catalog, in catalog order
pub fn catalog_coupon_payments(
    catalog: &InstrumentCatalog,
    investment: f64,
    tax_rate: f64,
) -> Vec<CouponPayment> {
    catalog
        .iter()
        .filter(|instrument| instrument.has_variable_coupon())
        .flat_map(|instrument| coupon_payments(instrument, investment, tax_rate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_note_stats() {
        let catalog = InstrumentCatalog::default_catalog();
        let stats = coupon_stats(catalog.get("Structured Note").unwrap()).unwrap();

        assert_eq!(stats.months, 12);
        assert_relative_eq!(stats.total_pct, 14.99, epsilon = 1e-9);
        assert_relative_eq!(stats.min_pct, 0.96);
        assert_relative_eq!(stats.max_pct, 1.55);
    }

    #[test]
    fn test_payments_apply_tax() {
        let catalog = InstrumentCatalog::default_catalog();
        let payments = coupon_payments(catalog.get("Structured Note").unwrap(), 800_000.0, 0.13);

        assert_eq!(payments.len(), 12);
        assert_relative_eq!(payments[0].gross, 8_080.0, epsilon = 1e-6);
        assert_relative_eq!(payments[0].tax, 1_050.4, epsilon = 1e-6);
        let total_net: f64 = payments.iter().map(|p| p.net).sum();
        assert_relative_eq!(payments[11].cumulative_net, total_net, epsilon = 1e-6);
    }

    #[test]
    fn test_fixed_coupon_has_no_schedule() {
        let catalog = InstrumentCatalog::default_catalog();
        let deposit = catalog.get("Bank Deposit CR-0.5").unwrap();
        assert!(coupon_stats(deposit).is_none());
        assert!(coupon_payments(deposit, 1_000.0, 0.13).is_empty());
    }

    #[test]
    fn test_catalog_payments_cover_every_schedule() {
        let defaults = InstrumentCatalog::default_catalog();
        let mut second = defaults.get("Structured Note").unwrap().clone();
        second.name = "Structured Note II".to_string();
        let mut instruments = defaults.instruments().to_vec();
        instruments.push(second);
        let catalog = InstrumentCatalog::new(instruments).unwrap();

        let payments = catalog_coupon_payments(&catalog, 800_000.0, 0.13);
        assert_eq!(payments.len(), 24);
        assert!(payments[..12].iter().all(|p| p.instrument == "Structured Note"));
        assert!(payments[12..].iter().all(|p| p.instrument == "Structured Note II"));
        assert_eq!(payments[12].month, 1);
        assert_relative_eq!(payments[12].gross, payments[0].gross);

        assert!(catalog_coupon_payments(&defaults, 1_000.0, 0.13)
            .iter()
            .all(|p| p.instrument == "Structured Note"));
    }
}
