//! Portfolio state carried between simulation periods

/// Capital position at the start of a period
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    /// Completed periods (years or months, 0 at start)
    pub period: usize,

    /// Total capital in domestic units
    pub capital: f64,

    /// Foreign-currency share of capital (fraction), preserved across periods
    pub foreign_share: f64,
}

impl PortfolioState {
    pub fn new(capital: f64, foreign_share: f64) -> Self {
        Self {
            period: 0,
            capital,
            foreign_share,
        }
    }

    /// Move to the next period with the given end capital, floored at zero
    pub fn advance(&mut self, capital_end: f64) {
        self.capital = capital_end.max(0.0);
        self.period += 1;
    }

    /// Deduct a one-off charge (e.g. transaction cost) from capital
    pub fn charge(&mut self, amount: f64) {
        self.capital = (self.capital - amount).max(0.0);
    }
}
