use rust_decimal::Decimal;
use thiserror::Error;

/// Failure of a valuation, LBO or scenario computation
#[derive(Debug, Error)]
pub enum ValuationError {
    /// A field is outside its valid domain (non-positive revenue, zero hold period, ...)
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    /// Inputs are individually valid but jointly inconsistent, e.g. WACC not above terminal growth
    #[error("Invalid assumption: {0}")]
    InvalidAssumption(String),

    /// The IRR solver gave up; `last_delta` is the NPV at the last rate tried
    #[error("Convergence failure: {function} did not converge after {iterations} iterations (NPV at last rate: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ValuationError {
    fn from(e: serde_json::Error) -> Self {
        ValuationError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_messages() {
        let e = ValuationError::InvalidInput {
            field: "hold_period".into(),
            reason: "must be at least 1".into(),
        };
        assert_eq!(e.to_string(), "Invalid input: hold_period — must be at least 1");

        let e = ValuationError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 100,
            last_delta: dec!(0.5),
        };
        assert!(e.to_string().contains("after 100 iterations"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let e: ValuationError = parse.unwrap_err().into();
        assert!(matches!(e, ValuationError::SerializationError(_)));
    }
}
