use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ValuationError;
use crate::pe::debt_schedule::{self, DebtScheduleEntry};
use crate::pe::returns::{self, LboReturns, ReturnsInput};
use crate::pe::sources_uses::{self, SourcesUsesOutput};
use crate::tax::TaxPolicy;
use crate::time_value::compound_growth;
use crate::types::*;
use crate::EngineResult;

/// Tax treatment for LBO projections: a loss-making year pays no tax.
pub const LBO_TAX_POLICY: TaxPolicy = TaxPolicy::FlooredAtZero;

/// Input for a single-tranche LBO with a full cash sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LboAssumptions {
    pub ticker: String,
    #[serde(default)]
    pub company_name: String,

    // Transaction
    /// Enterprise value paid at entry
    pub purchase_price: Money,
    /// Entry EV/EBITDA multiple (informational; the price is given directly)
    pub purchase_multiple: Multiple,
    /// EV/EBITDA multiple used to value the equity every year
    pub exit_multiple: Multiple,

    // Debt
    /// Share of the purchase price financed with debt
    pub debt_percent: Rate,
    /// Blended interest rate on the acquisition debt
    pub interest_rate: Rate,

    // Operating assumptions
    pub base_revenue: Money,
    pub revenue_growth: Rate,
    pub ebitda_margin: Rate,
    pub capex_percent: Rate,
    pub nwc_percent: Rate,
    pub tax_rate: Rate,

    /// Hold period in years
    pub hold_period: u32,
    /// Annual sponsor fee as a share of entry equity
    #[serde(alias = "management_fees")]
    pub management_fee_rate: Rate,
}

/// Deal request that prices the target off its current EBITDA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LboRequest {
    pub ticker: String,
    #[serde(default)]
    pub company_name: String,
    pub base_revenue: Money,
    pub revenue_growth: Rate,
    pub ebitda_margin: Rate,
    pub capex_percent: Rate,
    pub nwc_percent: Rate,
    pub tax_rate: Rate,
    #[serde(default = "default_multiple")]
    pub purchase_multiple: Multiple,
    #[serde(default = "default_multiple")]
    pub exit_multiple: Multiple,
    #[serde(default = "default_debt_percent")]
    pub debt_percent: Rate,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: Rate,
    #[serde(default = "default_hold_period")]
    pub hold_period: u32,
    #[serde(default = "default_management_fee_rate")]
    pub management_fee_rate: Rate,
}

fn default_multiple() -> Multiple {
    dec!(10)
}

fn default_debt_percent() -> Rate {
    dec!(0.60)
}

fn default_interest_rate() -> Rate {
    dec!(0.06)
}

fn default_hold_period() -> u32 {
    5
}

fn default_management_fee_rate() -> Rate {
    dec!(0.02)
}

impl LboRequest {
    /// Request with the standard deal terms (10x in, 10x out, 60% debt at 6%,
    /// 5-year hold, 2% fee).
    pub fn new(
        ticker: impl Into<String>,
        base_revenue: Money,
        revenue_growth: Rate,
        ebitda_margin: Rate,
        capex_percent: Rate,
        nwc_percent: Rate,
        tax_rate: Rate,
    ) -> Self {
        let ticker = ticker.into();
        LboRequest {
            company_name: ticker.clone(),
            ticker,
            base_revenue,
            revenue_growth,
            ebitda_margin,
            capex_percent,
            nwc_percent,
            tax_rate,
            purchase_multiple: default_multiple(),
            exit_multiple: default_multiple(),
            debt_percent: default_debt_percent(),
            interest_rate: default_interest_rate(),
            hold_period: default_hold_period(),
            management_fee_rate: default_management_fee_rate(),
        }
    }

    /// Seed the operating assumptions from a DCF assumption set.
    #[cfg(feature = "valuation")]
    pub fn from_assumption_set(assumptions: &crate::valuation::AssumptionSet) -> Self {
        LboRequest::new(
            assumptions.ticker.clone(),
            assumptions.base_revenue,
            assumptions.revenue_growth,
            assumptions.ebitda_margin,
            assumptions.capex_percent,
            assumptions.nwc_percent,
            assumptions.tax_rate,
        )
    }
}

impl LboAssumptions {
    /// Price the deal at base EBITDA × purchase multiple.
    pub fn from_request(request: &LboRequest) -> Self {
        let base_ebitda = request.base_revenue * request.ebitda_margin;
        LboAssumptions {
            ticker: request.ticker.clone(),
            company_name: request.company_name.clone(),
            purchase_price: base_ebitda * request.purchase_multiple,
            purchase_multiple: request.purchase_multiple,
            exit_multiple: request.exit_multiple,
            debt_percent: request.debt_percent,
            interest_rate: request.interest_rate,
            base_revenue: request.base_revenue,
            revenue_growth: request.revenue_growth,
            ebitda_margin: request.ebitda_margin,
            capex_percent: request.capex_percent,
            nwc_percent: request.nwc_percent,
            tax_rate: request.tax_rate,
            hold_period: request.hold_period,
            management_fee_rate: request.management_fee_rate,
        }
    }

    /// Equity cheque at entry: purchase price × (1 − debt share)
    pub fn entry_equity(&self) -> Money {
        self.purchase_price * (Decimal::ONE - self.debt_percent)
    }

    /// Opening balance of the acquisition debt
    pub fn initial_debt(&self) -> Money {
        self.purchase_price * self.debt_percent
    }
}

/// A single year in the LBO projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LboYearProjection {
    pub year: u32,
    pub revenue: Money,
    pub ebitda: Money,
    pub interest: Money,
    pub ebt: Money,
    /// Never negative
    pub taxes: Money,
    pub net_income: Money,
    pub capex: Money,
    pub nwc_change: Money,
    /// Net income + interest − CapEx − ΔNWC
    pub fcf: Money,
    pub management_fee: Money,
    pub fcf_after_fees: Money,
    pub debt_paydown: Money,
    /// Closing debt balance for the year
    pub debt_balance: Money,
    /// EBITDA × exit multiple − closing debt
    pub equity_value: Money,
}

/// Full LBO model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LboOutput {
    pub projections: Vec<LboYearProjection>,
    pub debt_schedule: Vec<DebtScheduleEntry>,
    pub sources_uses: SourcesUsesOutput,
    pub returns: LboReturns,
}

/// Build a complete LBO model from entry through exit.
///
/// All post-fee free cash flow sweeps the acquisition debt. The exit multiple
/// is applied to every year's EBITDA, not only the final one, so the implied
/// equity value can be read at any hold length; returns use the final year.
pub fn build_lbo(input: &LboAssumptions) -> EngineResult<ComputationOutput<LboOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_lbo_input(input)?;

    if input.debt_percent >= Decimal::ONE {
        warnings.push(format!(
            "Debt finances {}% of the purchase price; sponsor equity is not positive",
            input.debt_percent * dec!(100)
        ));
    }

    // ─── Sources & Uses ──────────────────────────────────────────────
    let su_output = sources_uses::build_sources_uses(input.purchase_price, input.debt_percent)?;
    if !su_output.funding_gap.is_zero() {
        warnings.push(format!(
            "Sources & Uses are not balanced: transaction fees of {} are not financed",
            su_output.uses.transaction_fees
        ));
    }

    // ─── Year-by-year projection ─────────────────────────────────────
    let projections = project_lbo(input, &mut warnings)?;

    // ─── Debt schedule ───────────────────────────────────────────────
    let debt_schedule = debt_schedule::build_debt_schedule(&projections);

    // ─── Returns ─────────────────────────────────────────────────────
    let exit_equity = projections
        .last()
        .map(|p| p.equity_value)
        .ok_or_else(|| ValuationError::InsufficientData("No hold-period years projected".into()))?;

    let returns_out = returns::calculate_lbo_returns(&ReturnsInput {
        entry_equity: input.entry_equity(),
        exit_equity,
        hold_period: input.hold_period,
    })?;
    absorb_warnings(&mut warnings, "Returns", returns_out.warnings);

    debug!(
        ticker = %input.ticker,
        irr = %returns_out.result.irr,
        moic = %returns_out.result.moic,
        "lbo model complete"
    );

    let output = LboOutput {
        projections,
        debt_schedule,
        sources_uses: su_output,
        returns: returns_out.result,
    };

    Ok(with_metadata(
        "Leveraged Buyout Model (full cash sweep)",
        input,
        warnings,
        start,
        output,
    ))
}

fn validate_lbo_input(input: &LboAssumptions) -> EngineResult<()> {
    if input.purchase_price <= Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Purchase price must be positive".into(),
        });
    }
    if input.base_revenue <= Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: "base_revenue".into(),
            reason: "Base revenue must be positive".into(),
        });
    }
    if input.hold_period == 0 {
        return Err(ValuationError::InvalidInput {
            field: "hold_period".into(),
            reason: "Hold period must be at least 1 year".into(),
        });
    }
    if input.debt_percent < Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: "debt_percent".into(),
            reason: "Debt share cannot be negative".into(),
        });
    }
    if input.interest_rate < Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: "interest_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if input.exit_multiple < Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: "exit_multiple".into(),
            reason: "Exit multiple cannot be negative".into(),
        });
    }
    Ok(())
}

fn project_lbo(
    input: &LboAssumptions,
    warnings: &mut Vec<String>,
) -> EngineResult<Vec<LboYearProjection>> {
    let mut projections: Vec<LboYearProjection> = Vec::with_capacity(input.hold_period as usize);
    let mut debt_balance = input.initial_debt();
    // Fee is fixed on entry equity, not on the current equity value
    let management_fee = input.entry_equity() * input.management_fee_rate;

    for year in 1..=input.hold_period {
        let revenue = compound_growth(input.base_revenue, input.revenue_growth, year)?;
        let ebitda = revenue * input.ebitda_margin;

        let interest = debt_balance * input.interest_rate;
        let ebt = ebitda - interest;
        let taxes = LBO_TAX_POLICY.tax(ebt, input.tax_rate);
        let net_income = ebt - taxes;

        let capex = revenue * input.capex_percent;
        let nwc_change = revenue * input.nwc_percent;
        let fcf = net_income + interest - capex - nwc_change;
        let fcf_after_fees = fcf - management_fee;

        // Cash shortfalls are not funded with new debt
        if fcf_after_fees < Decimal::ZERO {
            warnings.push(format!(
                "Year {year}: free cash flow after fees is negative ({fcf_after_fees}); no debt repaid"
            ));
        }
        let debt_paydown = fcf_after_fees.min(debt_balance).max(Decimal::ZERO);
        debt_balance = (debt_balance - debt_paydown).max(Decimal::ZERO);

        let equity_value = ebitda * input.exit_multiple - debt_balance;

        projections.push(LboYearProjection {
            year,
            revenue,
            ebitda,
            interest,
            ebt,
            taxes,
            net_income,
            capex,
            nwc_change,
            fcf,
            management_fee,
            fcf_after_fees,
            debt_paydown,
            debt_balance,
            equity_value,
        });
    }

    Ok(projections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pe::returns::IrrMethod;
    use rust_decimal_macros::dec;

    /// Helper: build a standard 5-year LBO input for tests
    fn standard_lbo_input() -> LboAssumptions {
        LboAssumptions {
            ticker: "TEST".into(),
            company_name: "Test Co".into(),
            purchase_price: dec!(1000),
            purchase_multiple: dec!(5),
            exit_multiple: dec!(6),
            debt_percent: dec!(0.60),
            interest_rate: dec!(0.05),
            base_revenue: dec!(1000),
            revenue_growth: dec!(0.05),
            ebitda_margin: dec!(0.20),
            capex_percent: dec!(0.03),
            nwc_percent: dec!(0.02),
            tax_rate: dec!(0.25),
            hold_period: 5,
            management_fee_rate: dec!(0.02),
        }
    }

    #[test]
    fn test_basic_lbo_returns() {
        let result = build_lbo(&standard_lbo_input()).unwrap();
        let out = &result.result;

        assert_eq!(out.projections.len(), 5);
        assert_eq!(out.debt_schedule.len(), 5);
        assert!(out.returns.irr > Decimal::ZERO, "IRR should be positive, got {}", out.returns.irr);
        assert!(out.returns.moic > Decimal::ONE, "MOIC should be > 1, got {}", out.returns.moic);
        assert_eq!(out.returns.irr_method, IrrMethod::NewtonRaphson);
    }

    #[test]
    fn test_income_statement_mechanics() {
        let mut input = standard_lbo_input();
        input.revenue_growth = Decimal::ZERO;
        input.hold_period = 1;

        let result = build_lbo(&input).unwrap();
        let p = &result.result.projections[0];

        // Revenue = 1000, EBITDA = 200
        assert_eq!(p.revenue, dec!(1000));
        assert_eq!(p.ebitda, dec!(200));
        // Interest = 600 * 0.05 = 30
        assert_eq!(p.interest, dec!(30));
        // EBT = 170, tax = 42.5, NI = 127.5
        assert_eq!(p.ebt, dec!(170));
        assert_eq!(p.taxes, dec!(42.5));
        assert_eq!(p.net_income, dec!(127.5));
        // FCF = 127.5 + 30 - 30 - 20 = 107.5
        assert_eq!(p.fcf, dec!(107.5));
        // Fee = 400 * 0.02 = 8
        assert_eq!(p.management_fee, dec!(8));
        assert_eq!(p.fcf_after_fees, dec!(99.5));
        assert_eq!(p.debt_paydown, dec!(99.5));
        assert_eq!(p.debt_balance, dec!(500.5));
        // Equity = 200 * 6 - 500.5
        assert_eq!(p.equity_value, dec!(699.5));
    }

    #[test]
    fn test_tax_floored_at_zero() {
        let mut input = standard_lbo_input();
        // Interest far above EBITDA
        input.interest_rate = dec!(0.50);
        let result = build_lbo(&input).unwrap();
        let p = &result.result.projections[0];
        assert!(p.ebt < Decimal::ZERO);
        assert_eq!(p.taxes, Decimal::ZERO);
        assert_eq!(p.net_income, p.ebt);
    }

    #[test]
    fn test_debt_never_negative_and_non_increasing() {
        let mut input = standard_lbo_input();
        input.debt_percent = dec!(0.10);
        input.hold_period = 8;
        let result = build_lbo(&input).unwrap();
        let projs = &result.result.projections;

        let mut prev = input.initial_debt();
        for p in projs {
            assert!(p.debt_balance >= Decimal::ZERO);
            assert!(p.debt_balance <= prev);
            prev = p.debt_balance;
        }
        // Small loan is fully repaid
        assert_eq!(projs.last().unwrap().debt_balance, Decimal::ZERO);
    }

    #[test]
    fn test_negative_fcf_repays_nothing() {
        let mut input = standard_lbo_input();
        input.capex_percent = dec!(0.40);
        let result = build_lbo(&input).unwrap();
        let p = &result.result.projections[0];
        assert!(p.fcf_after_fees < Decimal::ZERO);
        assert_eq!(p.debt_paydown, Decimal::ZERO);
        assert_eq!(p.debt_balance, dec!(600));
        assert!(result.warnings.iter().any(|w| w.contains("no debt repaid")));
    }

    #[test]
    fn test_debt_schedule_chains() {
        let result = build_lbo(&standard_lbo_input()).unwrap();
        let schedule = &result.result.debt_schedule;

        assert_eq!(schedule[0].beginning_balance, dec!(600));
        for pair in schedule.windows(2) {
            assert_eq!(pair[0].ending_balance, pair[1].beginning_balance);
        }
        for entry in schedule {
            assert_eq!(
                entry.beginning_balance - entry.principal_paydown,
                entry.ending_balance
            );
        }
    }

    #[test]
    fn test_exit_equity_from_final_year() {
        let result = build_lbo(&standard_lbo_input()).unwrap();
        let out = &result.result;
        let last = out.projections.last().unwrap();

        assert_eq!(out.returns.exit_equity, last.equity_value);
        assert_eq!(out.returns.entry_equity, dec!(400));
        assert_eq!(out.returns.moic, last.equity_value / dec!(400));
        assert_eq!(out.returns.cash_on_cash, out.returns.moic);
        assert_eq!(out.returns.total_return, last.equity_value - dec!(400));
    }

    #[test]
    fn test_sources_uses_warning() {
        let result = build_lbo(&standard_lbo_input()).unwrap();
        assert_eq!(result.result.sources_uses.uses.transaction_fees, dec!(20));
        assert!(result.warnings.iter().any(|w| w.contains("not balanced")));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut input = standard_lbo_input();
        input.hold_period = 0;
        assert!(build_lbo(&input).is_err());

        let mut input = standard_lbo_input();
        input.purchase_price = Decimal::ZERO;
        assert!(build_lbo(&input).is_err());

        let mut input = standard_lbo_input();
        input.base_revenue = dec!(-1);
        assert!(build_lbo(&input).is_err());
    }

    #[test]
    fn test_from_request_prices_off_ebitda() {
        let request = LboRequest::new(
            "ACME",
            dec!(1000),
            dec!(0.05),
            dec!(0.20),
            dec!(0.03),
            dec!(0.02),
            dec!(0.25),
        );
        let a = LboAssumptions::from_request(&request);
        // 1000 * 0.20 * 10x
        assert_eq!(a.purchase_price, dec!(2000));
        assert_eq!(a.debt_percent, dec!(0.60));
        assert_eq!(a.interest_rate, dec!(0.06));
        assert_eq!(a.hold_period, 5);
        assert_eq!(a.management_fee_rate, dec!(0.02));
    }

    #[cfg(feature = "valuation")]
    #[test]
    fn test_request_from_assumption_set() {
        let set = crate::valuation::AssumptionSet::new(
            "ACME",
            dec!(1000),
            dec!(0.05),
            dec!(0.20),
            dec!(100),
            dec!(10),
        );
        let request = LboRequest::from_assumption_set(&set);
        assert_eq!(request.base_revenue, dec!(1000));
        assert_eq!(request.tax_rate, set.tax_rate);
        assert_eq!(request.capex_percent, set.capex_percent);
        assert_eq!(request.purchase_multiple, dec!(10));
        assert_eq!(request.company_name, "ACME");
    }

    #[test]
    fn test_management_fees_alias() {
        let json = r#"{
            "ticker": "X", "purchase_price": 1000, "purchase_multiple": 5,
            "exit_multiple": 6, "debt_percent": 0.6, "interest_rate": 0.05,
            "base_revenue": 1000, "revenue_growth": 0.05, "ebitda_margin": 0.2,
            "capex_percent": 0.03, "nwc_percent": 0.02, "tax_rate": 0.25,
            "hold_period": 5, "management_fees": 0.02
        }"#;
        let a: LboAssumptions = serde_json::from_str(json).unwrap();
        assert_eq!(a.management_fee_rate, dec!(0.02));
        assert!(a.company_name.is_empty());
    }
}
