use serde::{Deserialize, Serialize};

use crate::types::*;

use super::lbo::LboYearProjection;

/// A single year of the acquisition debt schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtScheduleEntry {
    pub year: u32,
    pub beginning_balance: Money,
    pub interest: Money,
    pub principal_paydown: Money,
    pub ending_balance: Money,
}

/// Rebuild the debt schedule from the LBO projection.
///
/// Each year's beginning balance is its ending balance plus that year's
/// paydown, so the schedule chains exactly: ending(t) == beginning(t+1).
pub fn build_debt_schedule(projections: &[LboYearProjection]) -> Vec<DebtScheduleEntry> {
    projections
        .iter()
        .map(|p| DebtScheduleEntry {
            year: p.year,
            beginning_balance: p.debt_balance + p.debt_paydown,
            interest: p.interest,
            principal_paydown: p.debt_paydown,
            ending_balance: p.debt_balance,
        })
        .collect()
}
