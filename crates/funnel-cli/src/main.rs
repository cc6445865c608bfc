//! funnel - investor outreach tracker

use anyhow::Result;
use clap::Parser;

use funnel_cli::cli::commands::{run_import, run_logs, run_serve, run_ui};
use funnel_cli::cli::{Cli, Commands};
use funnel_cli::telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output_format();

    // The dashboard owns the terminal; keep stderr quiet unless asked.
    let default_directive = match cli.command {
        Commands::Ui(_) => "warn",
        _ => "info",
    };
    telemetry::init(cli.log_json, default_directive);

    match cli.command {
        Commands::Serve(args) => run_serve(&args),
        Commands::Import(args) => run_import(&args, format),
        Commands::Logs(args) => run_logs(&args, format),
        Commands::Ui(args) => run_ui(&args),
    }
}
