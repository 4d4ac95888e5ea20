pub mod assumptions;
pub mod dcf;
pub mod projection;

pub use assumptions::AssumptionSet;
pub use dcf::{calculate_dcf, calculate_upside, value_company, ValuationResult};
pub use projection::{project_financials, YearProjection};
