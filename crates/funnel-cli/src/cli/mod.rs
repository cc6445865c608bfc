//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

pub mod commands;

/// Default location of the evaluated-profiles export.
pub const DEFAULT_SEED_FILE: &str = "results/evaluated_profiles.ru_kz_by_full.json";

/// Investor outreach tracker: HTTP API, bulk import, and terminal dashboard
#[derive(Parser, Debug)]
#[command(name = "funnel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for command results
    #[arg(long, global = true, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit tracing output as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `--json` wins over `--format`.
    #[must_use]
    pub const fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Import evaluated profiles into the investors table
    Import(ImportArgs),

    /// Show recent audit log entries
    Logs(LogsArgs),

    /// Interactive dashboard
    Ui(UiArgs),
}

/// Store location and pool sizing, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// SQLite database path (a `sqlite://` prefix is accepted)
    #[arg(
        long = "database",
        env = "DATABASE_URL",
        default_value = "funnel.db",
        value_parser = commands::helpers::parse_database_path
    )]
    pub database: PathBuf,

    /// Maximum pooled connections
    #[arg(long, env = "FUNNEL_POOL_SIZE", default_value_t = 4)]
    pub pool_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Address to bind
    #[arg(long, env = "FUNNEL_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Profiles file used for startup seeding and `POST /api/load-data`
    #[arg(long, env = "FUNNEL_SEED_FILE", default_value = DEFAULT_SEED_FILE)]
    pub seed_file: PathBuf,

    /// Skip importing the seed file when the store is empty
    #[arg(long)]
    pub no_seed: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Profiles file to import
    #[arg(env = "FUNNEL_SEED_FILE", default_value = DEFAULT_SEED_FILE)]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct LogsArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Only show this action type
    #[arg(long)]
    pub action_type: Option<String>,

    /// Maximum entries
    #[arg(long, default_value_t = funnel_core::api::DEFAULT_LOG_LIMIT)]
    pub limit: i64,

    /// Entries to skip
    #[arg(long, default_value_t = 0)]
    pub offset: i64,
}

#[derive(Args, Debug, Clone)]
pub struct UiArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Base URL of a running `funnel serve`
    #[arg(long, env = "FUNNEL_SERVER", default_value = "http://127.0.0.1:3000")]
    pub server: String,

    /// Talk to the database directly instead of over HTTP
    #[arg(long)]
    pub local: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["funnel", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 3000);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.seed_file, PathBuf::from(DEFAULT_SEED_FILE));
        assert_eq!(args.db.pool_size, 4);
    }

    #[test]
    fn test_json_flag_overrides_format() {
        let cli =
            Cli::try_parse_from(["funnel", "--format", "text", "logs", "--json"]).unwrap();
        assert_eq!(cli.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_database_prefix_is_stripped() {
        let cli = Cli::try_parse_from([
            "funnel",
            "logs",
            "--database",
            "sqlite:///tmp/funnel.db",
        ])
        .unwrap();
        let Commands::Logs(args) = cli.command else {
            panic!("expected logs");
        };
        assert_eq!(args.db.database, PathBuf::from("/tmp/funnel.db"));
    }
}
