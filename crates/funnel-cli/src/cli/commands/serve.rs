//! Implementation of `funnel serve`.

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::commands::helpers::open_pool;
use crate::cli::ServeArgs;
use crate::server::{self, AppState};

/// Open the store, seed it if empty, and serve the HTTP API until Ctrl+C.
#[tracing::instrument(skip(args), fields(host = %args.host, port = args.port))]
pub fn run_serve(args: &ServeArgs) -> Result<()> {
    let pool = open_pool(&args.db)?;

    if !args.no_seed {
        server::seed_on_startup(&pool, &args.seed_file);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let addr = format!("{}:{}", args.host, args.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!(
            addr = %listener.local_addr()?,
            database = %args.db.database.display(),
            pool_size = args.db.pool_size,
            "funnel listening"
        );

        let state = AppState::new(pool, args.seed_file.clone());
        server::serve(listener, state, server::shutdown_signal()).await
    })
}
