#![allow(dead_code)]

//! In-process stand-in for the playerctl web backend.  Records every call so
//! tests can assert on paths, query strings and bodies.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub player: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug)]
pub struct BackendState {
    pub players: Vec<String>,
    pub status: String,
    pub title: String,
    pub artist: String,
    pub thumbnail: Option<String>,
    pub length: f64,
    pub position: f64,
    pub volume: f64,
    pub playlist: Vec<String>,
    pub current: Option<String>,
    pub current_fails: bool,
    pub calls: Vec<Call>,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            players: vec!["mpv".into(), "firefox.instance42".into()],
            status: "Paused".into(),
            title: "Song".into(),
            artist: "Band".into(),
            thumbnail: None,
            length: 200.0,
            position: 10.0,
            volume: 0.5,
            playlist: Vec::new(),
            current: None,
            current_fails: false,
            calls: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Arc<Mutex<BackendState>>,
}

#[derive(Debug, Deserialize)]
struct PlayerQuery {
    player: Option<String>,
}

impl MockBackend {
    pub fn with_playlist(items: &[&str], current: Option<&str>) -> Self {
        let backend = Self::default();
        {
            let mut s = backend.state.lock().unwrap();
            s.playlist = items.iter().map(|i| i.to_string()).collect();
            s.current = current.map(str::to_string);
        }
        backend
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    fn record(&self, method: &'static str, uri: &Uri, player: Option<String>, body: Option<Value>) {
        self.state.lock().unwrap().calls.push(Call {
            method,
            path: uri.path().to_string(),
            player,
            body,
        });
    }

    /// Serve on an ephemeral local port; returns the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

fn router(backend: MockBackend) -> Router {
    let mut app = Router::new()
        .route("/api/players", get(players))
        .route("/api/metadata", get(metadata))
        .route("/api/volume", get(volume))
        .route("/api/volume/:value", get(set_volume))
        .route("/api/seek/:delta", get(adjust))
        .route("/api/seek_absolute/:position", get(adjust))
        .route("/api/syncplay_playlist", get(playlist).post(set_playlist))
        .route("/api/syncplay_current", get(current))
        .route("/api/syncplay_set_index", axum::routing::post(set_index));
    for command in ["play", "pause", "play-pause", "next", "previous", "status"] {
        app = app.route(&format!("/api/{command}"), get(command_route));
    }
    app.with_state(backend)
}

async fn command_route(
    State(b): State<MockBackend>,
    uri: Uri,
    Query(q): Query<PlayerQuery>,
) -> Json<Value> {
    b.record("GET", &uri, q.player, None);
    let command = uri.path().trim_start_matches("/api/");
    let mut s = b.state.lock().unwrap();
    match command {
        "status" => return Json(json!({ "result": s.status })),
        "play" => s.status = "Playing".into(),
        "pause" => s.status = "Paused".into(),
        "play-pause" => {
            let next = if s.status == "Playing" { "Paused" } else { "Playing" };
            s.status = next.into();
        }
        _ => {}
    }
    Json(json!({ "result": null }))
}

async fn players(State(b): State<MockBackend>, uri: Uri) -> Json<Value> {
    b.record("GET", &uri, None, None);
    let s = b.state.lock().unwrap();
    let mut list = s.players.clone();
    // playerctl --list-all ends with a newline
    list.push(String::new());
    Json(json!(list))
}

async fn metadata(
    State(b): State<MockBackend>,
    uri: Uri,
    Query(q): Query<PlayerQuery>,
) -> Json<Value> {
    b.record("GET", &uri, q.player, None);
    let s = b.state.lock().unwrap();
    let mut body = json!({
        "title": s.title,
        "artist": s.artist,
        "length": s.length,
        "position": s.position,
    });
    if let Some(t) = &s.thumbnail {
        body["thumbnail"] = json!(t);
    }
    Json(body)
}

async fn volume(State(b): State<MockBackend>, uri: Uri, Query(q): Query<PlayerQuery>) -> Json<Value> {
    b.record("GET", &uri, q.player, None);
    Json(json!({ "volume": b.state.lock().unwrap().volume }))
}

async fn set_volume(
    State(b): State<MockBackend>,
    uri: Uri,
    Path(value): Path<String>,
    Query(q): Query<PlayerQuery>,
) -> Response {
    b.record("GET", &uri, q.player, None);
    // Only floats with a decimal point match, like the real route.
    if !value.contains('.') {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response();
    }
    match value.parse::<f64>() {
        Ok(v) => {
            b.state.lock().unwrap().volume = v;
            Json(json!({ "result": null })).into_response()
        }
        Err(_) => (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad volume" }))).into_response(),
    }
}

async fn adjust(State(b): State<MockBackend>, uri: Uri, Query(q): Query<PlayerQuery>) -> Json<Value> {
    b.record("GET", &uri, q.player, None);
    Json(json!({ "result": null }))
}

async fn playlist(State(b): State<MockBackend>, uri: Uri) -> Json<Value> {
    b.record("GET", &uri, None, None);
    Json(json!({ "playlist": b.state.lock().unwrap().playlist }))
}

async fn set_playlist(State(b): State<MockBackend>, uri: Uri, Json(body): Json<Value>) -> Response {
    b.record("POST", &uri, None, Some(body.clone()));
    let Some(items) = body["playlist"].as_array() else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid playlist data" })))
            .into_response();
    };
    let items: Vec<String> = items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    b.state.lock().unwrap().playlist = items;
    Json(json!({ "status": "success" })).into_response()
}

async fn current(State(b): State<MockBackend>, uri: Uri) -> Response {
    b.record("GET", &uri, None, None);
    let s = b.state.lock().unwrap();
    if s.current_fails {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "syncplay not connected" })),
        )
            .into_response();
    }
    Json(json!({ "current_item": s.current })).into_response()
}

async fn set_index(State(b): State<MockBackend>, uri: Uri, Json(body): Json<Value>) -> Response {
    b.record("POST", &uri, None, Some(body.clone()));
    let mut s = b.state.lock().unwrap();
    match body["index"].as_u64().map(|i| i as usize) {
        Some(i) if i < s.playlist.len() => {
            s.current = Some(s.playlist[i].clone());
            Json(json!({ "status": "success" })).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid index" }))).into_response(),
    }
}
