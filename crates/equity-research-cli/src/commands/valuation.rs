use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equity_research_core::valuation::{self, AssumptionSet};

use crate::input;

/// Company assumptions shared by `dcf` and `scenarios`
#[derive(Args)]
pub struct AssumptionArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Ticker symbol
    #[arg(long, default_value = "UNKNOWN")]
    pub ticker: String,

    /// Year-0 revenue
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// Annual revenue growth (0.08 = 8%)
    #[arg(long)]
    pub revenue_growth: Option<Decimal>,

    /// EBITDA margin
    #[arg(long)]
    pub ebitda_margin: Option<Decimal>,

    /// Net debt (negative for net cash)
    #[arg(long, allow_hyphen_values = true)]
    pub net_debt: Option<Decimal>,

    /// Diluted shares outstanding
    #[arg(long)]
    pub shares_outstanding: Option<Decimal>,

    /// Capital expenditure as a share of revenue
    #[arg(long)]
    pub capex_percent: Option<Decimal>,

    /// D&A as a share of revenue
    #[arg(long)]
    pub da_percent: Option<Decimal>,

    /// Working capital investment as a share of revenue
    #[arg(long)]
    pub nwc_percent: Option<Decimal>,

    /// Tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Discount rate (WACC)
    #[arg(long)]
    pub wacc: Option<Decimal>,

    /// Terminal growth rate
    #[arg(long)]
    pub terminal_growth_rate: Option<Decimal>,

    /// Projection years
    #[arg(long)]
    pub projection_years: Option<u32>,

    /// Current share price, for upside
    #[arg(long)]
    pub current_price: Option<Decimal>,
}

impl AssumptionArgs {
    /// Resolve assumptions from `--input`, then stdin, then flags.
    pub fn resolve(&self) -> Result<AssumptionSet, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return input::file::read_json(path);
        }
        if let Some(a) = input::stdin::read_stdin()? {
            return Ok(a);
        }

        let mut a = AssumptionSet::new(
            self.ticker.clone(),
            self.base_revenue
                .ok_or("--base-revenue is required (or provide --input)")?,
            self.revenue_growth
                .ok_or("--revenue-growth is required (or provide --input)")?,
            self.ebitda_margin
                .ok_or("--ebitda-margin is required (or provide --input)")?,
            self.net_debt
                .ok_or("--net-debt is required (or provide --input)")?,
            self.shares_outstanding
                .ok_or("--shares-outstanding is required (or provide --input)")?,
        );
        if let Some(v) = self.capex_percent {
            a.capex_percent = v;
        }
        if let Some(v) = self.da_percent {
            a.da_percent = v;
        }
        if let Some(v) = self.nwc_percent {
            a.nwc_percent = v;
        }
        if let Some(v) = self.tax_rate {
            a.tax_rate = v;
        }
        if let Some(v) = self.wacc {
            a.wacc = v;
        }
        if let Some(v) = self.terminal_growth_rate {
            a.terminal_growth_rate = v;
        }
        if let Some(v) = self.projection_years {
            a.projection_years = v;
        }
        if let Some(v) = self.current_price {
            a.current_price = v;
        }
        Ok(a)
    }
}

/// Arguments for DCF valuation
#[derive(Args)]
pub struct DcfArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

/// Arguments for the upside calculation
#[derive(Args)]
pub struct UpsideArgs {
    /// Intrinsic value per share
    #[arg(long, allow_hyphen_values = true)]
    pub value_per_share: Decimal,

    /// Current market price
    #[arg(long)]
    pub current_price: Decimal,
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = args.assumptions.resolve()?;
    let result = valuation::calculate_dcf(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_upside(args: UpsideArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let upside = valuation::calculate_upside(args.value_per_share, args.current_price);
    Ok(serde_json::json!({
        "result": {
            "value_per_share": args.value_per_share,
            "current_price": args.current_price,
            "upside_pct": upside,
        }
    }))
}
