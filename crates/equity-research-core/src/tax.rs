//! Tax policies.
//!
//! The DCF and LBO paths treat loss-making years differently. The DCF books a
//! negative tax (a credit) on negative EBIT, while the LBO never lets tax drop
//! below zero. Both behaviours feed reported valuations, so they stay as two
//! named policies instead of one shared formula.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxPolicy {
    /// tax = taxable income × rate, negative when income is negative
    Unfloored,
    /// tax = max(0, taxable income × rate)
    FlooredAtZero,
}

impl TaxPolicy {
    pub fn tax(self, taxable_income: Money, rate: Rate) -> Money {
        let raw = taxable_income * rate;
        match self {
            TaxPolicy::Unfloored => raw,
            TaxPolicy::FlooredAtZero => raw.max(Decimal::ZERO),
        }
    }
}
