use napi::Result as NapiResult;
use napi_derive::napi;
use serde_json::Value;

use equity_research_core::pe::{self, LboAssumptions, LboRequest};
use equity_research_core::scenarios;
use equity_research_core::valuation::{self, AssumptionSet};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn run_dcf(input_json: String) -> NapiResult<String> {
    let input: AssumptionSet = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = valuation::calculate_dcf(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_scenarios(input_json: String) -> NapiResult<String> {
    let input: AssumptionSet = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = scenarios::generate_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Private equity
// ---------------------------------------------------------------------------

/// Accepts full `LboAssumptions`, or an `LboRequest` (no `purchase_price`)
/// that is priced off base EBITDA with the standard deal terms.
#[napi]
pub fn run_lbo(input_json: String) -> NapiResult<String> {
    let value: Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let input: LboAssumptions = if value.get("purchase_price").is_some() {
        serde_json::from_value(value).map_err(to_napi_error)?
    } else {
        let request: LboRequest = serde_json::from_value(value).map_err(to_napi_error)?;
        LboAssumptions::from_request(&request)
    };
    let output = pe::build_lbo(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
