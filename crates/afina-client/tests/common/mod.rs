#![allow(dead_code)]

use afina_client::api::BackendClient;
use afina_client::storage::LocalStorage;
use afina_client::typing::TypingTiming;
use afina_client::{Notice, Session};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct UploadSeen {
    pub db_name: String,
    pub generator_type: String,
    pub files: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct CannedUpload {
    pub delay: Duration,
    pub status: u16,
    /// Sent verbatim; need not be JSON.
    pub body: String,
}

#[derive(Debug, Default)]
pub struct Backend {
    pub chat_bodies: Vec<Value>,
    pub chat_status: Option<u16>,
    pub chat_reply: String,
    pub listing: Vec<Value>,
    pub listing_calls: usize,
    pub selections: Vec<Vec<i64>>,
    pub selection_status: Option<u16>,
    pub uploads: Vec<UploadSeen>,
    /// Keyed by the `generator_type` form field.
    pub upload_replies: HashMap<String, CannedUpload>,
}

pub type Shared = Arc<Mutex<Backend>>;

async fn chat(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut g = s.lock().unwrap();
    g.chat_bodies.push(body);
    let status = StatusCode::from_u16(g.chat_status.unwrap_or(200)).unwrap();
    (status, Json(json!({ "response": g.chat_reply }))).into_response()
}

async fn databases(State(s): State<Shared>) -> Json<Value> {
    let mut g = s.lock().unwrap();
    g.listing_calls += 1;
    Json(Value::Array(g.listing.clone()))
}

async fn selected(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut g = s.lock().unwrap();
    let ids = body["selected"].as_array().cloned().unwrap_or_default();
    g.selections.push(ids.iter().filter_map(Value::as_i64).collect());
    let status = StatusCode::from_u16(g.selection_status.unwrap_or(200)).unwrap();
    (status, Json(json!({ "status": "ok" }))).into_response()
}

async fn parameters() -> Json<Value> {
    Json(json!({ "n_predict": 1024, "temperature": 0.2, "top_k": 10, "rag_k": 4, "rag_sim_threshold": 0.6 }))
}

async fn upload(State(s): State<Shared>, mut mp: Multipart) -> Response {
    let mut seen = UploadSeen::default();
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string).unwrap_or_default();
        let text = field.text().await.unwrap_or_default();
        match name.as_str() {
            "db_name" => seen.db_name = text,
            "generator_type" => seen.generator_type = text,
            "files" => seen.files.push((file_name, text)),
            _ => {}
        }
    }
    let canned = {
        let mut g = s.lock().unwrap();
        let c = g.upload_replies.get(&seen.generator_type).cloned();
        g.uploads.push(seen.clone());
        c.unwrap_or(CannedUpload {
            delay: Duration::ZERO,
            status: 200,
            body: json!({ "message": format!("Created {}", seen.db_name) }).to_string(),
        })
    };
    tokio::time::sleep(canned.delay).await;
    let status = StatusCode::from_u16(canned.status).unwrap();
    (status, [("content-type", "application/json")], canned.body).into_response()
}

/// In-process backend on an ephemeral port. Returns its base URL.
pub async fn spawn_backend(state: Shared) -> String {
    let app = Router::new()
        .route("/chat", post(chat))
        .route("/upload", post(upload))
        .route("/databases", get(databases))
        .route("/selected_databases", post(selected))
        .route("/parameters", get(parameters))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap(); });
    format!("http://{}:{}", addr.ip(), addr.port())
}

pub fn session(base: &str, home: &Path) -> Session {
    let client = BackendClient::new(base, Duration::from_secs(5)).unwrap();
    Session::new(client, LocalStorage::open(home).unwrap())
        .with_typing_timing(TypingTiming { indicator_delay: Duration::from_millis(5), tick: Duration::from_millis(1) })
}

/// Apply events until `done` holds or `within` elapses. Returns the notices seen.
pub async fn drive(s: &mut Session, within: Duration, mut done: impl FnMut(&Session) -> bool) -> Vec<Notice> {
    let deadline = tokio::time::Instant::now() + within;
    let mut notices = Vec::new();
    while !done(s) {
        match tokio::time::timeout_at(deadline, s.next_event()).await {
            Ok(Some(ev)) => notices.extend(s.apply(ev)),
            Ok(None) | Err(_) => break,
        }
    }
    notices
}

/// Apply whatever arrives during `window`.
pub async fn settle(s: &mut Session, window: Duration) -> Vec<Notice> {
    drive(s, window, |_| false).await
}

/// Poll `cond` until it holds or `within` elapses.
pub async fn wait_until(within: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while !cond() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    true
}
