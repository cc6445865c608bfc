//! Route handlers.
//!
//! Store access is synchronous, so every handler hops onto the blocking pool,
//! checks out a connection there, and drops it before returning.

use std::net::SocketAddr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use funnel_core::api::{ApiResponse, LogQuery, NewLogEntry, NoteUpdate, ProgressUpdate};
use funnel_core::core::{CoreResult, FunnelServices, RequestOrigin, SeedOutcome};
use funnel_core::model::{FlatRow, LogEntry};

use super::error::AppError;
use super::AppState;

/// Run `f` against a pooled connection on the blocking thread pool.
async fn with_services<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&FunnelServices<'_>) -> CoreResult<T> + Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let db = pool.get()?;
        f(&FunnelServices::new(&db))
    })
    .await
    .map_err(AppError::internal)?
    .map_err(AppError::from)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[tracing::instrument(skip(state))]
pub async fn list_investors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<FlatRow>>>, AppError> {
    let rows = with_services(&state, |s| s.investors().flat()).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_progress(
    State(state): State<AppState>,
    payload: Result<Json<ProgressUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Json(update) = payload?;
    with_services(&state, move |s| s.progress().apply(&update)).await?;
    Ok(Json(ApiResponse::done()))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_note(
    State(state): State<AppState>,
    payload: Result<Json<NoteUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Json(update) = payload?;
    with_services(&state, move |s| {
        s.notes()
            .apply(update.investor_id, update.note_text.as_deref())
    })
    .await?;
    Ok(Json(ApiResponse::done()))
}

#[tracing::instrument(skip(state, query))]
pub async fn list_logs(
    State(state): State<AppState>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>, AppError> {
    let Query(query) = query?;
    let entries = with_services(&state, move |s| s.audit().list(&query)).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

#[tracing::instrument(skip(state, headers, payload))]
pub async fn create_log(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<NewLogEntry>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Json(entry) = payload?;
    let origin = request_origin(&headers, peer);
    with_services(&state, move |s| {
        s.audit()
            .record(&entry.action_type, entry.action_data.as_ref(), Some(&origin))
    })
    .await?;
    Ok(Json(ApiResponse::done()))
}

#[tracing::instrument(skip(state))]
pub async fn load_data(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let seed_file = state.seed_file.clone();
    let outcome = with_services(&state, move |s| s.import().seed_if_empty(&seed_file)).await?;

    let body = match outcome {
        SeedOutcome::AlreadyLoaded { count } => json!({
            "success": true,
            "message": "already loaded",
            "count": count,
        }),
        SeedOutcome::Imported(report) => {
            info!(
                inserted = report.inserted,
                skipped = report.skipped,
                "loaded seed data"
            );
            json!({
                "success": true,
                "message": "loaded",
                "inserted": report.inserted,
                "skipped": report.skipped,
                "total": report.total,
            })
        }
    };
    Ok(Json(body))
}

/// Client address: first `X-Forwarded-For` hop, else the TCP peer.
fn request_origin(headers: &HeaderMap, peer: SocketAddr) -> RequestOrigin {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    RequestOrigin {
        user_agent,
        ip_address: Some(forwarded.unwrap_or_else(|| peer.ip().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        SocketAddr::from(([192, 168, 1, 9], 50000))
    }

    #[test]
    fn test_origin_from_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("funnel-tui/0.3"));

        let origin = request_origin(&headers, peer());
        assert_eq!(origin.user_agent.as_deref(), Some("funnel-tui/0.3"));
        assert_eq!(origin.ip_address.as_deref(), Some("192.168.1.9"));
    }

    #[test]
    fn test_origin_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        let origin = request_origin(&headers, peer());
        assert_eq!(origin.user_agent, None);
        assert_eq!(origin.ip_address.as_deref(), Some("203.0.113.7"));
    }
}
