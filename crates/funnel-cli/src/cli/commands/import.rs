//! Implementation of `funnel import`.

use anyhow::Result;

use funnel_core::core::FunnelServices;

use crate::cli::commands::helpers::open_pool;
use crate::cli::ImportArgs;
use crate::output::{Formatter, OutputFormat};

/// Import a profiles file and print the insert/skip report.
#[tracing::instrument(skip(args, format), fields(file = %args.file.display()))]
pub fn run_import(args: &ImportArgs, format: OutputFormat) -> Result<()> {
    let pool = open_pool(&args.db)?;
    let db = pool.get()?;

    let report = FunnelServices::new(&db).import().import_file(&args.file)?;

    Formatter::new(format).print(&report)?;
    Ok(())
}
