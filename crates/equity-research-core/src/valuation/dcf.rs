use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ValuationError;
use crate::time_value::compound_factor;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::EngineResult;

use super::assumptions::AssumptionSet;
use super::projection::{project_financials, YearProjection};

/// Terminal value share of EV above which a warning is raised.
const TERMINAL_VALUE_WARNING_PCT: Decimal = dec!(0.75);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Output of the DCF valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Year-by-year projections, year 1 first
    pub projections: Vec<YearProjection>,
    /// Enterprise value = PV(FCF) + PV(TV)
    pub enterprise_value: Money,
    /// Equity value = EV - net debt
    pub equity_value: Money,
    pub value_per_share: Money,
    /// Sum of present values of explicit-period FCFs
    pub pv_fcf: Money,
    /// Undiscounted Gordon growth terminal value at year N
    pub terminal_value: Money,
    /// Present value of terminal value
    pub pv_terminal: Money,
    /// PV(TV) as a fraction of enterprise value
    pub terminal_value_pct: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run an end-of-year FCF DCF valuation with a Gordon growth terminal value.
pub fn calculate_dcf(
    assumptions: &AssumptionSet,
) -> EngineResult<ComputationOutput<ValuationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = value_company(assumptions)?;

    let negative_ebit_years: Vec<u32> = output
        .projections
        .iter()
        .filter(|p| p.ebit < Decimal::ZERO)
        .map(|p| p.year)
        .collect();
    if !negative_ebit_years.is_empty() {
        warnings.push(format!(
            "Negative EBIT in years {negative_ebit_years:?}; tax is booked as a credit in those years"
        ));
    }

    if output.terminal_value_pct > TERMINAL_VALUE_WARNING_PCT {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the projection horizon",
            output.terminal_value_pct * dec!(100)
        ));
    }

    if output.equity_value < Decimal::ZERO {
        warnings.push("Net debt exceeds enterprise value; equity value is negative".into());
    }

    debug!(
        ticker = %assumptions.ticker,
        enterprise_value = %output.enterprise_value,
        value_per_share = %output.value_per_share,
        "dcf valuation complete"
    );

    Ok(with_metadata(
        "FCF DCF (end-of-year discounting, Gordon growth terminal value)",
        assumptions,
        warnings,
        start,
        output,
    ))
}

/// Pure DCF valuation: the same input always yields an identical result.
pub fn value_company(assumptions: &AssumptionSet) -> EngineResult<ValuationResult> {
    assumptions.validate_valuation()?;

    let projections = project_financials(assumptions)?;
    let wacc = assumptions.wacc;
    let n_years = assumptions.projection_years;

    // --- Discount explicit-period cash flows ---
    let mut pv_fcf = Decimal::ZERO;
    for p in &projections {
        pv_fcf = pv_fcf
            .checked_add(discount(p.fcf, wacc, p.year)?)
            .ok_or_else(|| overflow("pv_fcf"))?;
    }

    // --- Terminal value ---
    let final_fcf = projections
        .last()
        .map(|p| p.fcf)
        .ok_or_else(|| ValuationError::InsufficientData("No projection years generated".into()))?;
    let terminal_value =
        calculate_terminal_value(final_fcf, wacc, assumptions.terminal_growth_rate)?;
    let pv_terminal = discount(terminal_value, wacc, n_years)?;

    // --- Enterprise and equity value ---
    let enterprise_value = pv_fcf
        .checked_add(pv_terminal)
        .ok_or_else(|| overflow("enterprise_value"))?;
    let equity_value = enterprise_value
        .checked_sub(assumptions.net_debt)
        .ok_or_else(|| overflow("equity_value"))?;
    let value_per_share = equity_value
        .checked_div(assumptions.shares_outstanding)
        .ok_or_else(|| overflow("value_per_share"))?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_terminal
            .checked_div(enterprise_value)
            .ok_or_else(|| overflow("terminal_value_pct"))?
    };

    Ok(ValuationResult {
        projections,
        enterprise_value,
        equity_value,
        value_per_share,
        pv_fcf,
        terminal_value,
        pv_terminal,
        terminal_value_pct,
    })
}

/// Gordon growth terminal value: FCF_N × (1 + g) / (WACC − g).
///
/// Fails with `InvalidAssumption` when WACC does not exceed g; there is no
/// fallback denominator.
pub fn calculate_terminal_value(
    final_fcf: Money,
    wacc: Rate,
    terminal_growth_rate: Rate,
) -> EngineResult<Money> {
    let denominator = wacc - terminal_growth_rate;
    if denominator <= Decimal::ZERO {
        return Err(ValuationError::InvalidAssumption(format!(
            "WACC ({wacc}) must exceed terminal growth rate ({terminal_growth_rate})"
        )));
    }
    final_fcf
        .checked_mul(Decimal::ONE + terminal_growth_rate)
        .and_then(|grown| grown.checked_div(denominator))
        .ok_or_else(|| {
            ValuationError::InvalidAssumption(format!(
                "WACC ({wacc}) minus terminal growth ({terminal_growth_rate}) is too small; \
                 terminal value overflows decimal range"
            ))
        })
}

/// amount / (1 + wacc)^year
fn discount(amount: Money, wacc: Rate, year: u32) -> EngineResult<Money> {
    amount
        .checked_div(compound_factor(wacc, year)?)
        .ok_or_else(|| overflow("discounted cash flow"))
}

fn overflow(field: &str) -> ValuationError {
    ValuationError::InvalidInput {
        field: field.into(),
        reason: "Value overflows decimal range".into(),
    }
}

/// Upside (positive) or downside (negative) of intrinsic value versus the
/// market price, in percent, rounded to 2 dp. Zero when there is no price.
pub fn calculate_upside(value_per_share: Money, current_price: Money) -> Rate {
    if current_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((value_per_share - current_price) / current_price * dec!(100)).round_dp(2)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_assumptions() -> AssumptionSet {
        AssumptionSet {
            ticker: "SAMPLE".into(),
            base_revenue: dec!(1000),
            revenue_growth: dec!(0.05),
            ebitda_margin: dec!(0.25),
            net_margin: dec!(0.15),
            capex_percent: dec!(0.05),
            da_percent: dec!(0.03),
            nwc_percent: dec!(0.02),
            tax_rate: dec!(0.25),
            wacc: dec!(0.10),
            terminal_growth_rate: dec!(0.025),
            projection_years: 5,
            net_debt: dec!(200),
            shares_outstanding: dec!(100),
            current_price: dec!(10),
        }
    }

    #[test]
    fn test_basic_dcf() {
        let result = calculate_dcf(&sample_assumptions()).unwrap();
        let out = &result.result;

        assert_eq!(out.projections.len(), 5);
        assert_eq!(out.projections[0].revenue, dec!(1050));
        assert!(out.enterprise_value > Decimal::ZERO);
        assert_eq!(out.enterprise_value, out.pv_fcf + out.pv_terminal);
        assert_eq!(out.equity_value, out.enterprise_value - dec!(200));
        assert_eq!(out.value_per_share, out.equity_value / dec!(100));
    }

    #[test]
    fn test_pv_fcf_matches_manual_discounting() {
        let out = value_company(&sample_assumptions()).unwrap();
        let manual: Decimal = out
            .projections
            .iter()
            .map(|p| p.fcf / compound_factor(dec!(0.10), p.year).unwrap())
            .sum();
        assert!((out.pv_fcf - manual).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_terminal_value_gordon() {
        let out = value_company(&sample_assumptions()).unwrap();
        let last_fcf = out.projections.last().unwrap().fcf;
        let expected = last_fcf * dec!(1.025) / dec!(0.075);
        assert_eq!(out.terminal_value, expected);
        assert!(out.terminal_value_pct > Decimal::ZERO && out.terminal_value_pct < Decimal::ONE);
    }

    #[test]
    fn test_terminal_value_overflow_is_invalid_assumption() {
        let result = calculate_terminal_value(
            dec!(40_000_000_000),
            dec!(0.09),
            dec!(0.0899999999999999999),
        );
        assert!(matches!(result, Err(ValuationError::InvalidAssumption(_))));
    }

    #[test]
    fn test_terminal_value_rejects_non_spread() {
        assert!(matches!(
            calculate_terminal_value(dec!(100), dec!(0.03), dec!(0.03)),
            Err(ValuationError::InvalidAssumption(_))
        ));
        assert!(calculate_terminal_value(dec!(100), dec!(0.02), dec!(0.03)).is_err());
        assert_eq!(
            calculate_terminal_value(dec!(100), dec!(0.10), dec!(0.0)).unwrap(),
            dec!(1000)
        );
    }

    #[test]
    fn test_wacc_equal_terminal_growth_fails_whole_valuation() {
        let mut a = sample_assumptions();
        a.wacc = dec!(0.025);
        assert!(matches!(
            calculate_dcf(&a),
            Err(ValuationError::InvalidAssumption(_))
        ));
    }

    #[test]
    fn test_zero_shares_rejected() {
        let mut a = sample_assumptions();
        a.shares_outstanding = Decimal::ZERO;
        assert!(matches!(
            calculate_dcf(&a),
            Err(ValuationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let a = sample_assumptions();
        assert_eq!(value_company(&a).unwrap(), value_company(&a).unwrap());
    }

    #[test]
    fn test_negative_ebit_warns_but_succeeds() {
        let mut a = sample_assumptions();
        a.ebitda_margin = dec!(0.02);
        a.da_percent = dec!(0.04);
        let result = calculate_dcf(&a).unwrap();
        assert!(result.result.projections.iter().all(|p| p.tax < Decimal::ZERO));
        assert!(result.warnings.iter().any(|w| w.contains("Negative EBIT")));
    }

    #[test]
    fn test_upside() {
        assert_eq!(calculate_upside(dec!(120), dec!(100)), dec!(20));
        assert_eq!(calculate_upside(dec!(80), dec!(100)), dec!(-20));
        // 1/3 upside rounds to 2 dp
        assert_eq!(calculate_upside(dec!(4), dec!(3)), dec!(33.33));
        assert_eq!(calculate_upside(dec!(50), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_methodology() {
        let result = calculate_dcf(&sample_assumptions()).unwrap();
        assert!(result.methodology.contains("Gordon growth"));
        assert_eq!(result.metadata.precision, "rust_decimal_128bit");
    }
}
