use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::*;
use crate::EngineResult;

/// Transaction fees as a share of purchase price.
pub const TRANSACTION_FEE_RATE: Rate = dec!(0.02);

/// Funding raised at entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSources {
    pub debt: Money,
    pub equity: Money,
    pub total: Money,
}

/// Funding spent at entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingUses {
    pub purchase_price: Money,
    pub transaction_fees: Money,
    pub total: Money,
}

/// Output for Sources & Uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesUsesOutput {
    pub sources: FundingSources,
    pub uses: FundingUses,
    /// Uses not covered by sources (the fees, since sources only fund the price)
    pub funding_gap: Money,
}

/// Build the Sources & Uses table for a buyout financed with a fixed share of
/// debt. Fees are charged on top of the purchase price and are not financed.
pub fn build_sources_uses(
    purchase_price: Money,
    debt_percent: Rate,
) -> EngineResult<SourcesUsesOutput> {
    if purchase_price <= Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Purchase price must be positive".into(),
        });
    }
    if debt_percent < Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: "debt_percent".into(),
            reason: "Debt share of purchase price cannot be negative".into(),
        });
    }

    let debt = purchase_price * debt_percent;
    let equity = purchase_price * (Decimal::ONE - debt_percent);
    let transaction_fees = purchase_price * TRANSACTION_FEE_RATE;

    let sources = FundingSources {
        debt,
        equity,
        total: debt + equity,
    };
    let uses = FundingUses {
        purchase_price,
        transaction_fees,
        total: purchase_price + transaction_fees,
    };
    let funding_gap = uses.total - sources.total;

    Ok(SourcesUsesOutput {
        sources,
        uses,
        funding_gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sixty_forty_split() {
        let out = build_sources_uses(dec!(1000), dec!(0.60)).unwrap();
        assert_eq!(out.sources.debt, dec!(600));
        assert_eq!(out.sources.equity, dec!(400));
        assert_eq!(out.sources.total, dec!(1000));
        assert_eq!(out.uses.transaction_fees, dec!(20));
        assert_eq!(out.uses.total, dec!(1020));
        assert_eq!(out.funding_gap, dec!(20));
    }

    #[test]
    fn test_all_equity() {
        let out = build_sources_uses(dec!(500), Decimal::ZERO).unwrap();
        assert_eq!(out.sources.debt, Decimal::ZERO);
        assert_eq!(out.sources.equity, dec!(500));
    }

    #[test]
    fn test_zero_price_error() {
        assert!(build_sources_uses(Decimal::ZERO, dec!(0.5)).is_err());
    }

    #[test]
    fn test_negative_debt_share_error() {
        assert!(build_sources_uses(dec!(1000), dec!(-0.1)).is_err());
    }
}
