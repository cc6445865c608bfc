//! `FunnelClient` over the funnel HTTP API.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use funnel_core::api::{ApiResponse, NewLogEntry, NoteUpdate, ProgressUpdate};
use funnel_core::model::FlatRow;

use crate::client::FunnelClient;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP client for a running `funnel serve`.
pub struct HttpClient {
    base_url: String,
    http: Client,
}

impl HttpClient {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("funnel-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .with_context(|| format!("POST {path} failed"))?;
        read_envelope::<serde_json::Value>(path, response)?;
        Ok(())
    }
}

/// Decode `{success, data?, error?}` and turn failures into errors.
fn read_envelope<T: DeserializeOwned>(path: &str, response: Response) -> Result<Option<T>> {
    let status = response.status();
    let envelope: ApiResponse<T> = response
        .json()
        .with_context(|| format!("{path} returned an unreadable body ({status})"))?;

    if !status.is_success() || !envelope.success {
        bail!(
            "{}",
            envelope
                .error
                .unwrap_or_else(|| format!("{path} returned {status}"))
        );
    }
    Ok(envelope.data)
}

impl FunnelClient for HttpClient {
    fn fetch_rows(&self) -> Result<Vec<FlatRow>> {
        let path = "/api/investors";
        let response = self
            .http
            .get(self.url(path))
            .send()
            .with_context(|| format!("GET {path} failed"))?;
        Ok(read_envelope(path, response)?.unwrap_or_default())
    }

    fn save_progress(&self, update: &ProgressUpdate) -> Result<()> {
        self.post("/api/progress", update)
    }

    fn save_note(&self, update: &NoteUpdate) -> Result<()> {
        self.post("/api/notes", update)
    }

    fn log_action(&self, entry: &NewLogEntry) -> Result<()> {
        self.post("/api/logs", entry)
    }
}
