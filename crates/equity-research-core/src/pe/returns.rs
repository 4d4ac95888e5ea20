use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::ValuationError;
use crate::time_value::{closed_form_irr, irr};
use crate::types::*;
use crate::EngineResult;

const IRR_GUESS: Rate = dec!(0.10);

/// How the reported IRR was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrMethod {
    /// Root of the NPV function found by Newton-Raphson
    NewtonRaphson,
    /// |MOIC|^(1/n) − 1, used when the root-finder did not converge
    ClosedFormApproximation,
}

/// Input for sponsor returns on a single entry / single exit investment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsInput {
    /// Equity invested at entry
    pub entry_equity: Money,
    /// Equity value at exit
    pub exit_equity: Money,
    /// Years between entry and exit
    pub hold_period: u32,
}

/// Sponsor returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LboReturns {
    pub entry_equity: Money,
    pub exit_equity: Money,
    /// Exit equity minus entry equity
    pub total_return: Money,
    pub irr: Rate,
    pub irr_method: IrrMethod,
    /// Multiple on Invested Capital
    pub moic: Multiple,
    /// Same as MOIC: no interim distributions are modelled
    pub cash_on_cash: Multiple,
}

/// Calculate IRR, MOIC and cash-on-cash for [-entry, 0, ..., 0, +exit].
///
/// IRR is solved with Newton-Raphson. If the solver fails to converge (for
/// example a non-positive exit leaves the cash flows without a sign change)
/// the closed-form approximation is reported instead and flagged in
/// `irr_method` and the warnings. A convergence failure is never returned.
pub fn calculate_lbo_returns(input: &ReturnsInput) -> EngineResult<ComputationOutput<LboReturns>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.hold_period == 0 {
        return Err(ValuationError::InvalidInput {
            field: "hold_period".into(),
            reason: "Hold period must be at least 1 year".into(),
        });
    }

    // MOIC fails safe to zero when no equity was invested
    let moic = if input.entry_equity > Decimal::ZERO {
        input.exit_equity / input.entry_equity
    } else {
        warnings.push("Entry equity is not positive; MOIC reported as 0".into());
        Decimal::ZERO
    };
    let cash_on_cash = moic;

    let cash_flows = equity_cash_flows(input.entry_equity, input.exit_equity, input.hold_period);
    let (irr_value, irr_method) = match irr(&cash_flows, IRR_GUESS) {
        Ok(rate) => (rate, IrrMethod::NewtonRaphson),
        Err(ValuationError::ConvergenceFailure {
            iterations,
            last_delta,
            ..
        }) => {
            warn!(
                iterations,
                %last_delta,
                "IRR solver did not converge; using closed-form approximation"
            );
            warnings.push(format!(
                "IRR solver did not converge after {iterations} iterations; reporting closed-form approximation"
            ));
            (
                closed_form_irr(moic, input.hold_period)?,
                IrrMethod::ClosedFormApproximation,
            )
        }
        Err(e) => return Err(e),
    };

    let output = LboReturns {
        entry_equity: input.entry_equity,
        exit_equity: input.exit_equity,
        total_return: input.exit_equity - input.entry_equity,
        irr: irr_value,
        irr_method,
        moic,
        cash_on_cash,
    };

    Ok(with_metadata(
        "Sponsor Returns (IRR, MOIC, Cash-on-Cash)",
        input,
        warnings,
        start,
        output,
    ))
}

/// [-entry, 0, ..., 0, +exit] with `hold_period` periods after entry.
fn equity_cash_flows(entry_equity: Money, exit_equity: Money, hold_period: u32) -> Vec<Money> {
    let mut flows = Vec::with_capacity(hold_period as usize + 1);
    flows.push(-entry_equity);
    flows.extend(std::iter::repeat(Decimal::ZERO).take(hold_period as usize - 1));
    flows.push(exit_equity);
    flows
}
