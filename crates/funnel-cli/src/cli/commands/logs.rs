//! Implementation of `funnel logs`.

use anyhow::Result;

use funnel_core::api::LogQuery;
use funnel_core::core::FunnelServices;

use crate::cli::commands::helpers::open_pool;
use crate::cli::LogsArgs;
use crate::output::{Formatter, OutputFormat};

/// Print audit log entries, newest first.
#[tracing::instrument(skip(args, format))]
pub fn run_logs(args: &LogsArgs, format: OutputFormat) -> Result<()> {
    let pool = open_pool(&args.db)?;
    let db = pool.get()?;

    let query = LogQuery {
        action_type: args.action_type.clone(),
        limit: args.limit,
        offset: args.offset,
    };
    let entries = FunnelServices::new(&db).audit().list(&query)?;

    Formatter::new(format).print_list(&entries, "No log entries.", "logs")?;
    Ok(())
}
