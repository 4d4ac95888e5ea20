use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ValuationError;
use crate::types::{Money, Multiple, Rate};
use crate::EngineResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Growth factor (1 + rate)^periods.
pub fn compound_factor(rate: Rate, periods: u32) -> EngineResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| ValuationError::InvalidInput {
            field: "rate".into(),
            reason: format!("(1 + {rate})^{periods} overflows decimal range"),
        })
}

/// Value of `base` after compounding at a constant `rate` for `periods` years.
///
/// Always compounds from the year-0 base rather than chaining prior years, so
/// year t does not inherit rounding from year t-1.
pub fn compound_growth(base: Money, rate: Rate, periods: u32) -> EngineResult<Money> {
    base.checked_mul(compound_factor(rate, periods)?)
        .ok_or_else(|| ValuationError::InvalidInput {
            field: "rate".into(),
            reason: format!(
                "{base} compounded at {rate} for {periods} periods overflows decimal range"
            ),
        })
}

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> EngineResult<Money> {
    if rate <= dec!(-1) {
        return Err(ValuationError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(ValuationError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Cash flows without both a negative and a positive entry have no root and
/// fail immediately with `ConvergenceFailure`.
pub fn irr(cash_flows: &[Money], guess: Rate) -> EngineResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ValuationError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !(has_outflow && has_inflow) {
        return Err(ValuationError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 0,
            last_delta: cash_flows.iter().sum(),
        });
    }

    let mut rate = guess;
    let mut last_delta = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        let mut npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;
        let one_plus_r = Decimal::ONE + rate;

        for (t, cf) in cash_flows.iter().enumerate() {
            let t_i = t as i64;
            // Out-of-range discounting at the clamp bounds counts as non-convergence
            let (term, slope) = match discounted_terms(*cf, one_plus_r, t_i) {
                Some(terms) => terms,
                None => {
                    return Err(ValuationError::ConvergenceFailure {
                        function: "IRR".into(),
                        iterations: i,
                        last_delta: npv_val,
                    })
                }
            };
            npv_val += term;
            dnpv -= slope;
        }

        last_delta = npv_val;
        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(ValuationError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        rate = match npv_val.checked_div(dnpv).and_then(|step| rate.checked_sub(step)) {
            Some(next) => next,
            None => {
                return Err(ValuationError::ConvergenceFailure {
                    function: "IRR".into(),
                    iterations: i,
                    last_delta: npv_val,
                })
            }
        };

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    Err(ValuationError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta,
    })
}

/// cf / (1+r)^t and its derivative magnitude t·cf / (1+r)^(t+1), or `None`
/// when either leaves the decimal range.
fn discounted_terms(cf: Money, one_plus_r: Decimal, t: i64) -> Option<(Money, Money)> {
    if t == 0 {
        return Some((cf, Decimal::ZERO));
    }
    let discount = one_plus_r.checked_powi(t)?;
    let term = cf.checked_div(discount)?;
    let slope = Decimal::from(t)
        .checked_mul(cf)?
        .checked_div(discount.checked_mul(one_plus_r)?)?;
    Some((term, slope))
}

/// Annualised return implied by a multiple over `periods` years:
/// |multiple|^(1/periods) − 1.
///
/// Exact for a single outflow followed by a single inflow; used when the
/// root-finder cannot produce an answer.
pub fn closed_form_irr(multiple: Multiple, periods: u32) -> EngineResult<Rate> {
    if periods == 0 {
        return Err(ValuationError::InvalidInput {
            field: "periods".into(),
            reason: "Closed-form IRR needs at least one period".into(),
        });
    }

    let magnitude = multiple.abs();
    if magnitude.is_zero() {
        return Ok(dec!(-1));
    }

    let exponent = Decimal::ONE / Decimal::from(periods);
    let root = magnitude
        .checked_powd(exponent)
        .ok_or_else(|| ValuationError::InvalidInput {
            field: "multiple".into(),
            reason: format!("Cannot take the {periods}-th root of {magnitude}"),
        })?;

    Ok(root - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compound_growth_overflow_is_error() {
        let result = compound_growth(dec!(1_000_000_000_000), dec!(0.5), 100);
        assert!(matches!(result, Err(ValuationError::InvalidInput { .. })));
    }

    #[test]
    fn test_compound_growth_from_base() {
        assert_eq!(compound_growth(dec!(100), dec!(0.08), 1).unwrap(), dec!(108));
        assert_eq!(compound_growth(dec!(100), dec!(0.10), 2).unwrap(), dec!(121));
        assert_eq!(compound_growth(dec!(100), dec!(0.10), 0).unwrap(), dec!(100));
    }

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        assert!(npv(dec!(-1), &[dec!(-100), dec!(110)]).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_zero_intermediate_flows() {
        // -100 then +200 after 5 years => 2^(1/5) - 1 ≈ 14.87%
        let cfs = vec![
            dec!(-100),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(200),
        ];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!((result - dec!(0.148698)).abs() < dec!(0.00001));
        assert!(npv(result, &cfs).unwrap().abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_no_sign_change_fails() {
        let cfs = vec![dec!(-100), dec!(0), dec!(-50)];
        assert!(matches!(
            irr(&cfs, dec!(0.10)),
            Err(ValuationError::ConvergenceFailure { .. })
        ));
    }

    #[test]
    fn test_irr_needs_two_flows() {
        assert!(matches!(
            irr(&[dec!(-100)], dec!(0.10)),
            Err(ValuationError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_closed_form_irr() {
        let r = closed_form_irr(dec!(2), 5).unwrap();
        assert!((r - dec!(0.148698)).abs() < dec!(0.00001));
        assert_eq!(closed_form_irr(dec!(0), 5).unwrap(), dec!(-1));
        // Sign of the multiple is ignored
        let neg = closed_form_irr(dec!(-2), 5).unwrap();
        assert!((neg - r).abs() < dec!(0.0000001));
        assert!(closed_form_irr(dec!(2), 0).is_err());
    }
}
