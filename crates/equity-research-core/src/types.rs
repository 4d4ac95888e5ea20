use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Currency amounts (revenue, cash flows, enterprise and equity values).
pub type Money = Decimal;

/// Fractions such as growth, margins and discount rates: 0.08 = 8%.
pub type Rate = Decimal;

/// Valuation multiples and MOIC (10 = 10x)
pub type Multiple = Decimal;

/// Arithmetic backing every figure in an envelope
pub const PRECISION: &str = "rust_decimal_128bit";

/// Envelope returned by every public engine operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    /// JSON echo of the input the result was computed from
    pub assumptions: serde_json::Value,
    /// Non-fatal diagnostics, in the order they were raised
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    /// Engine crate version
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a result in its envelope, timing from `started`.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    started: Instant,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: started.elapsed().as_micros() as u64,
            precision: PRECISION.to_string(),
        },
    }
}

/// Append a nested computation's warnings, tagged with where they came from.
pub fn absorb_warnings(warnings: &mut Vec<String>, source: &str, nested: Vec<String>) {
    warnings.extend(nested.into_iter().map(|w| format!("[{source}] {w}")));
}
