use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::{Money, Rate};
use crate::EngineResult;

/// Flat operating and market assumptions for one company.
///
/// Supplied by the data-acquisition layer and never mutated by the engine.
/// Scenario analysis derives new sets from a base rather than editing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionSet {
    pub ticker: String,
    /// Year-0 revenue the projection compounds from
    pub base_revenue: Money,
    /// Constant annual revenue growth over the horizon
    pub revenue_growth: Rate,
    pub ebitda_margin: Rate,
    /// Carried for downstream consumers; not used in any calculation
    #[serde(default = "default_net_margin")]
    pub net_margin: Rate,
    #[serde(default = "default_capex_percent")]
    pub capex_percent: Rate,
    /// Depreciation & amortisation as a share of revenue
    #[serde(default = "default_da_percent")]
    pub da_percent: Rate,
    /// Net working capital investment as a share of revenue
    #[serde(default = "default_nwc_percent")]
    pub nwc_percent: Rate,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Rate,
    /// Discount rate
    #[serde(default = "default_wacc")]
    pub wacc: Rate,
    #[serde(default = "default_terminal_growth_rate")]
    pub terminal_growth_rate: Rate,
    #[serde(default = "default_projection_years")]
    pub projection_years: u32,
    pub net_debt: Money,
    pub shares_outstanding: Decimal,
    /// Zero when no market price is known; upside is then reported as 0
    #[serde(default)]
    pub current_price: Money,
}

fn default_net_margin() -> Rate {
    dec!(0.15)
}

fn default_capex_percent() -> Rate {
    dec!(0.05)
}

fn default_da_percent() -> Rate {
    dec!(0.03)
}

fn default_nwc_percent() -> Rate {
    dec!(0.02)
}

fn default_tax_rate() -> Rate {
    dec!(0.21)
}

fn default_wacc() -> Rate {
    dec!(0.08)
}

fn default_terminal_growth_rate() -> Rate {
    dec!(0.025)
}

fn default_projection_years() -> u32 {
    10
}

impl AssumptionSet {
    /// Assumption set with the standard defaults for every optional field.
    pub fn new(
        ticker: impl Into<String>,
        base_revenue: Money,
        revenue_growth: Rate,
        ebitda_margin: Rate,
        net_debt: Money,
        shares_outstanding: Decimal,
    ) -> Self {
        AssumptionSet {
            ticker: ticker.into(),
            base_revenue,
            revenue_growth,
            ebitda_margin,
            net_margin: default_net_margin(),
            capex_percent: default_capex_percent(),
            da_percent: default_da_percent(),
            nwc_percent: default_nwc_percent(),
            tax_rate: default_tax_rate(),
            wacc: default_wacc(),
            terminal_growth_rate: default_terminal_growth_rate(),
            projection_years: default_projection_years(),
            net_debt,
            shares_outstanding,
            current_price: Decimal::ZERO,
        }
    }

    /// Checks needed before anything is projected.
    pub fn validate_projection(&self) -> EngineResult<()> {
        if self.base_revenue <= Decimal::ZERO {
            return Err(ValuationError::InvalidInput {
                field: "base_revenue".into(),
                reason: "Base revenue must be positive".into(),
            });
        }
        if self.projection_years == 0 {
            return Err(ValuationError::InvalidInput {
                field: "projection_years".into(),
                reason: "Projection horizon must be at least 1 year".into(),
            });
        }
        Ok(())
    }

    /// Full validation for a DCF valuation. Runs before any computation so a
    /// failing input never yields a partial result.
    pub fn validate_valuation(&self) -> EngineResult<()> {
        self.validate_projection()?;

        if self.shares_outstanding <= Decimal::ZERO {
            return Err(ValuationError::InvalidInput {
                field: "shares_outstanding".into(),
                reason: "Shares outstanding must be positive".into(),
            });
        }
        if self.wacc <= dec!(-1) {
            return Err(ValuationError::InvalidInput {
                field: "wacc".into(),
                reason: "Discount rate must be greater than -100%".into(),
            });
        }
        if self.wacc <= self.terminal_growth_rate {
            return Err(ValuationError::InvalidAssumption(format!(
                "Discount rate ({}) must exceed terminal growth rate ({}); terminal value diverges",
                self.wacc, self.terminal_growth_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> AssumptionSet {
        AssumptionSet::new("TEST", dec!(1000), dec!(0.05), dec!(0.25), dec!(100), dec!(10))
    }

    #[test]
    fn test_defaults_applied() {
        let a = sample();
        assert_eq!(a.wacc, dec!(0.08));
        assert_eq!(a.terminal_growth_rate, dec!(0.025));
        assert_eq!(a.projection_years, 10);
        assert_eq!(a.current_price, Decimal::ZERO);
        assert!(a.validate_valuation().is_ok());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = r#"{
            "ticker": "AAPL",
            "base_revenue": 394000000000,
            "revenue_growth": 0.08,
            "ebitda_margin": 0.30,
            "net_debt": 50000000000,
            "shares_outstanding": 15500000000
        }"#;
        let a: AssumptionSet = serde_json::from_str(json).unwrap();
        assert_eq!(a.base_revenue, dec!(394000000000));
        assert_eq!(a.revenue_growth, dec!(0.08));
        assert_eq!(a.capex_percent, dec!(0.05));
        assert_eq!(a.da_percent, dec!(0.03));
        assert_eq!(a.nwc_percent, dec!(0.02));
        assert_eq!(a.tax_rate, dec!(0.21));
        assert_eq!(a.net_margin, dec!(0.15));
        assert_eq!(a.projection_years, 10);
    }

    #[test]
    fn test_non_positive_revenue_rejected() {
        let mut a = sample();
        a.base_revenue = Decimal::ZERO;
        assert!(matches!(
            a.validate_projection(),
            Err(ValuationError::InvalidInput { ref field, .. }) if field == "base_revenue"
        ));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut a = sample();
        a.projection_years = 0;
        assert!(a.validate_projection().is_err());
    }

    #[test]
    fn test_non_positive_shares_rejected() {
        let mut a = sample();
        a.shares_outstanding = Decimal::ZERO;
        assert!(matches!(
            a.validate_valuation(),
            Err(ValuationError::InvalidInput { ref field, .. }) if field == "shares_outstanding"
        ));
    }

    #[test]
    fn test_wacc_equal_to_terminal_growth_is_invalid_assumption() {
        let mut a = sample();
        a.wacc = dec!(0.03);
        a.terminal_growth_rate = dec!(0.03);
        assert!(matches!(
            a.validate_valuation(),
            Err(ValuationError::InvalidAssumption(_))
        ));
    }
}
