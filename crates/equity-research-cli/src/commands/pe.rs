use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equity_research_core::pe::{self, LboAssumptions, LboRequest};

use crate::input;

/// Arguments for the LBO model
#[derive(Args)]
pub struct LboArgs {
    /// Path to JSON file holding full LBO assumptions
    #[arg(long)]
    pub input: Option<String>,

    /// Ticker symbol
    #[arg(long, default_value = "UNKNOWN")]
    pub ticker: String,

    /// Year-0 revenue
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// Annual revenue growth
    #[arg(long)]
    pub revenue_growth: Option<Decimal>,

    /// EBITDA margin
    #[arg(long)]
    pub ebitda_margin: Option<Decimal>,

    /// Capital expenditure as a share of revenue
    #[arg(long, default_value = "0.05")]
    pub capex_percent: Decimal,

    /// Working capital investment as a share of revenue
    #[arg(long, default_value = "0.02")]
    pub nwc_percent: Decimal,

    /// Tax rate
    #[arg(long, default_value = "0.21")]
    pub tax_rate: Decimal,

    /// Entry EV/EBITDA multiple
    #[arg(long, default_value = "10")]
    pub purchase_multiple: Decimal,

    /// Exit EV/EBITDA multiple
    #[arg(long, default_value = "10")]
    pub exit_multiple: Decimal,

    /// Share of the price funded with debt
    #[arg(long, default_value = "0.60")]
    pub debt_percent: Decimal,

    /// Interest rate on acquisition debt
    #[arg(long, default_value = "0.06")]
    pub interest_rate: Decimal,

    /// Hold period in years
    #[arg(long, default_value = "5")]
    pub hold_period: u32,

    /// Annual management fee on entry equity
    #[arg(long, default_value = "0.02")]
    pub management_fee_rate: Decimal,
}

pub fn run_lbo(args: LboArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lbo_input: LboAssumptions = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        let request = LboRequest {
            ticker: args.ticker.clone(),
            company_name: args.ticker,
            base_revenue: args
                .base_revenue
                .ok_or("--base-revenue is required (or provide --input)")?,
            revenue_growth: args
                .revenue_growth
                .ok_or("--revenue-growth is required (or provide --input)")?,
            ebitda_margin: args
                .ebitda_margin
                .ok_or("--ebitda-margin is required (or provide --input)")?,
            capex_percent: args.capex_percent,
            nwc_percent: args.nwc_percent,
            tax_rate: args.tax_rate,
            purchase_multiple: args.purchase_multiple,
            exit_multiple: args.exit_multiple,
            debt_percent: args.debt_percent,
            interest_rate: args.interest_rate,
            hold_period: args.hold_period,
            management_fee_rate: args.management_fee_rate,
        };
        LboAssumptions::from_request(&request)
    };

    let result = pe::build_lbo(&lbo_input)?;
    Ok(serde_json::to_value(result)?)
}
