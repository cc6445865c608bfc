//! Implementation of `funnel ui`.

use anyhow::Result;

use funnel_tui::{HttpClient, LocalClient};

use crate::cli::commands::helpers::open_pool;
use crate::cli::UiArgs;

/// Launch the terminal dashboard against a server or, with `--local`, the
/// database directly.
#[tracing::instrument(skip(args), fields(local = args.local))]
pub fn run_ui(args: &UiArgs) -> Result<()> {
    if args.local {
        let pool = open_pool(&args.db)?;
        funnel_tui::run(LocalClient::new(pool))
    } else {
        funnel_tui::run(HttpClient::new(&args.server)?)
    }
}
