//! End-to-end tests for the HTTP API over a real listener.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use funnel_cli::server::{self, AppState};
use funnel_core::store::DbPool;

struct TestServer {
    base: String,
    client: reqwest::Client,
    dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = DbPool::open(&dir.path().join("funnel.db"), 2, Duration::from_secs(5)).unwrap();
        let state = AppState::new(pool, dir.path().join("profiles.json"));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            server::serve(listener, state, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            dir,
            shutdown: Some(tx),
        }
    }

    fn seed_path(&self) -> std::path::PathBuf {
        self.dir.path().join("profiles.json")
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .header("user-agent", "api-test/1.0")
            .json(body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn write_profiles(path: &Path) {
    let profiles = json!([
        { "First Name": "Ada", "Last Name": "Lovelace", "Current Company": "Engines", "investor_score": 9 },
        { "First Name": "Grace", "Last Name": "Hopper", "Current Title": "Admiral" },
        { "First Name": "", "Last Name": "" }
    ]);
    std::fs::write(path, profiles.to_string()).unwrap();
}

async fn investor_id(server: &TestServer, name: &str) -> i64 {
    let (_, body) = server.get("/api/investors").await;
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["name"] == name)
        .and_then(|row| row["id"].as_i64())
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn load_data_missing_file_is_404() {
    let server = TestServer::start().await;
    let (status, body) = server.post("/api/load-data", &json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn load_data_then_already_loaded() {
    let server = TestServer::start().await;
    write_profiles(&server.seed_path());

    let (status, body) = server.post("/api/load-data", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 2);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["total"], 2);

    let (_, again) = server.post("/api/load-data", &json!({})).await;
    assert_eq!(again["message"], "already loaded");
    assert_eq!(again["count"], 2);
}

#[tokio::test]
async fn progress_and_notes_round_trip_through_flat_rows() {
    let server = TestServer::start().await;
    write_profiles(&server.seed_path());
    server.post("/api/load-data", &json!({})).await;
    let ada = investor_id(&server, "Ada Lovelace").await;

    let (status, body) = server
        .post(
            "/api/progress",
            &json!({ "investor_id": ada, "owner_name": "Антон", "stage": "MSG", "is_active": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    server
        .post(
            "/api/progress",
            &json!({ "investor_id": ada, "owner_name": "Антон", "stage": "CALL", "is_active": true }),
        )
        .await;
    server
        .post(
            "/api/notes",
            &json!({ "investor_id": ada, "note_text": "  intro via Grace  " }),
        )
        .await;

    let (_, body) = server.get("/api/investors").await;
    let rows: Vec<&Value> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|row| row["id"] == ada)
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["owner_name"], "Антон");
    assert_eq!(rows[0]["stage"], "CALL");
    assert_eq!(rows[0]["is_active"], true);
    assert_eq!(rows[0]["note_text"], "intro via Grace");

    // Clearing progress and note
    server
        .post(
            "/api/progress",
            &json!({ "investor_id": ada, "owner_name": "Anton", "is_active": false }),
        )
        .await;
    server
        .post("/api/notes", &json!({ "investor_id": ada, "note_text": "   " }))
        .await;

    let (_, body) = server.get("/api/investors").await;
    let row = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["id"] == ada)
        .unwrap()
        .clone();
    assert!(row["owner_name"].is_null());
    assert!(row["note_text"].is_null());
}

#[tokio::test]
async fn validation_and_not_found_errors() {
    let server = TestServer::start().await;

    let (status, body) = server
        .post(
            "/api/progress",
            &json!({ "investor_id": 1, "owner_name": "Иван", "stage": "MSG", "is_active": true }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post(
            "/api/progress",
            &json!({ "investor_id": 1, "owner_name": "Павел", "stage": "DONE", "is_active": true }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post("/api/notes", &json!({ "investor_id": 404, "note_text": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn logs_record_mutations_and_client_actions() {
    let server = TestServer::start().await;
    write_profiles(&server.seed_path());
    server.post("/api/load-data", &json!({})).await;
    let grace = investor_id(&server, "Grace Hopper").await;

    server
        .post(
            "/api/progress",
            &json!({ "investor_id": grace, "owner_name": "Павел", "stage": "INV", "is_active": true }),
        )
        .await;
    let (status, _) = server
        .post(
            "/api/logs",
            &json!({ "action_type": "FILTER_CHANGE", "action_data": { "owner": "both" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.get("/api/logs?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries[0]["action_type"], "FILTER_CHANGE");
    assert_eq!(entries[0]["user_agent"], "api-test/1.0");
    assert_eq!(entries[0]["ip_address"], "127.0.0.1");
    assert_eq!(entries[1]["action_type"], "PROGRESS_UPDATE");
    assert_eq!(entries[1]["action_data"]["stage"], "INV");

    let (_, filtered) = server.get("/api/logs?action_type=PROGRESS_UPDATE").await;
    assert_eq!(filtered["data"].as_array().unwrap().len(), 1);

    let (status, _) = server.get("/api/logs?limit=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
