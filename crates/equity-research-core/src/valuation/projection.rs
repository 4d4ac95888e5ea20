use serde::{Deserialize, Serialize};

use crate::tax::TaxPolicy;
use crate::time_value::compound_growth;
use crate::types::Money;
use crate::EngineResult;

use super::assumptions::AssumptionSet;

/// Tax treatment for DCF projections: losses produce a tax credit.
pub const DCF_TAX_POLICY: TaxPolicy = TaxPolicy::Unfloored;

/// One projected year of the operating model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    /// 1-based year index
    pub year: u32,
    pub revenue: Money,
    pub ebitda: Money,
    pub depreciation_amortization: Money,
    pub ebit: Money,
    /// Negative when EBIT is negative
    pub tax: Money,
    pub nopat: Money,
    pub capex: Money,
    pub nwc_change: Money,
    /// NOPAT + D&A − CapEx − ΔNWC
    pub fcf: Money,
}

/// Project `projection_years` years of revenue, earnings and free cash flow.
///
/// Revenue compounds from the year-0 base at a constant growth rate; every
/// other line is a fixed share of that year's revenue.
pub fn project_financials(assumptions: &AssumptionSet) -> EngineResult<Vec<YearProjection>> {
    assumptions.validate_projection()?;

    (1..=assumptions.projection_years)
        .map(|year| project_year(assumptions, year))
        .collect()
}

fn project_year(a: &AssumptionSet, year: u32) -> EngineResult<YearProjection> {
    let revenue = compound_growth(a.base_revenue, a.revenue_growth, year)?;
    let ebitda = revenue * a.ebitda_margin;
    let da = revenue * a.da_percent;
    let ebit = ebitda - da;
    let tax = DCF_TAX_POLICY.tax(ebit, a.tax_rate);
    let nopat = ebit - tax;
    let capex = revenue * a.capex_percent;
    // ΔNWC is a share of the year's revenue, not the change in an NWC balance
    let nwc_change = revenue * a.nwc_percent;
    let fcf = nopat + da - capex - nwc_change;

    Ok(YearProjection {
        year,
        revenue,
        ebitda,
        depreciation_amortization: da,
        ebit,
        tax,
        nopat,
        capex,
        nwc_change,
        fcf,
    })
}
