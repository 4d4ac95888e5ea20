//! Intrinsic-value engine: DCF valuation, LBO returns and Bull/Base/Bear
//! scenario analysis over a flat set of operating assumptions.
//!
//! Every calculation is a pure function of its input. Nothing here performs
//! I/O or holds shared state, so results can be computed concurrently.

pub mod error;
pub mod tax;
pub mod time_value;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "pe")]
pub mod pe;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for all engine operations
pub type EngineResult<T> = Result<T, ValuationError>;
