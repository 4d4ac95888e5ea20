use clap::Args;
use serde_json::Value;

use equity_research_core::scenarios;

use super::valuation::AssumptionArgs;

/// Arguments for Bull/Base/Bear scenario analysis
#[derive(Args)]
pub struct ScenariosArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = args.assumptions.resolve()?;
    let result = scenarios::generate_scenarios(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}
