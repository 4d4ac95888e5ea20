mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::pe::LboArgs;
use commands::scenarios::ScenariosArgs;
use commands::valuation::{DcfArgs, UpsideArgs};

/// Intrinsic valuation: DCF, LBO returns and scenario analysis
#[derive(Parser)]
#[command(
    name = "eqr",
    version,
    about = "Intrinsic valuation: DCF, LBO returns and scenario analysis",
    long_about = "A CLI for equity research valuation with decimal precision. \
                  Runs FCF DCF valuations, leveraged buyout returns (IRR, MOIC) \
                  and Bull/Base/Bear scenario analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Discounted Cash Flow valuation
    Dcf(DcfArgs),
    /// Build a leveraged buyout model (IRR, MOIC, debt schedule)
    Lbo(LboArgs),
    /// Value Bull, Base and Bear cases
    Scenarios(ScenariosArgs),
    /// Percentage upside of a value per share over a market price
    Upside(UpsideArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_level) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::Lbo(args) => commands::pe::run_lbo(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::Upside(args) => commands::valuation::run_upside(args),
        Commands::Version => {
            println!("eqr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
