pub mod debt_schedule;
pub mod lbo;
pub mod returns;
pub mod sources_uses;

pub use lbo::{build_lbo, LboAssumptions, LboOutput, LboRequest, LboYearProjection};
