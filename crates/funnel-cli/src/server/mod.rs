//! HTTP API over the funnel store.
//!
//! | method | path              | body / query                                  |
//! |--------|-------------------|-----------------------------------------------|
//! | GET    | `/health`         |                                               |
//! | GET    | `/api/investors`  |                                               |
//! | POST   | `/api/progress`   | `{investor_id, owner_name, stage?, is_active?}` |
//! | POST   | `/api/notes`      | `{investor_id, note_text?}`                   |
//! | GET    | `/api/logs`       | `?action_type&limit&offset`                   |
//! | POST   | `/api/logs`       | `{action_type, action_data?}`                 |
//! | POST   | `/api/load-data`  |                                               |

pub mod error;
mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use funnel_core::core::{CoreError, FunnelServices, ImportError, SeedOutcome};
use funnel_core::store::DbPool;

pub use error::AppError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pool: DbPool,
    seed_file: Arc<PathBuf>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: DbPool, seed_file: PathBuf) -> Self {
        Self {
            pool,
            seed_file: Arc::new(seed_file),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/investors", get(handlers::list_investors))
        .route("/api/progress", post(handlers::update_progress))
        .route("/api/notes", post(handlers::update_note))
        .route(
            "/api/logs",
            get(handlers::list_logs).post(handlers::create_log),
        )
        .route("/api/load-data", post(handlers::load_data))
        .with_state(state)
        .layer(cors)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// Import the seed file if the store is empty. Never fails startup.
pub fn seed_on_startup(pool: &DbPool, seed_file: &Path) {
    let outcome = pool
        .get()
        .and_then(|db| FunnelServices::new(&db).import().seed_if_empty(seed_file));

    match outcome {
        Ok(SeedOutcome::AlreadyLoaded { count }) => {
            debug!(count, "store already seeded");
        }
        Ok(SeedOutcome::Imported(report)) => {
            info!(
                inserted = report.inserted,
                skipped = report.skipped,
                total = report.total,
                "seeded investors"
            );
        }
        Err(CoreError::Import(ImportError::SourceNotFound { path })) => {
            warn!(path = %path.display(), "seed file not found, starting empty");
        }
        Err(err) => {
            warn!(error = %err, "seeding failed, starting without data");
        }
    }
}
