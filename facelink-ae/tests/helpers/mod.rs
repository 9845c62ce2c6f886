//! Test helpers: an in-process mock of the recognition platform REST API.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use std::sync::{Arc, Mutex};

use facelink_ae::services::enrollment::{
    RegisterWatchlistMemberRequest, SearchInWatchlistRequest, SearchResultGroup,
};

/// Records every request and serves configurable responses.
#[derive(Clone)]
pub struct RecordingApi {
    pub registrations: Arc<Mutex<Vec<RegisterWatchlistMemberRequest>>>,
    pub searches: Arc<Mutex<Vec<SearchInWatchlistRequest>>>,
    /// Body returned by the search endpoint
    pub search_response: Arc<Mutex<Vec<SearchResultGroup>>>,
    /// Status returned by the register endpoint
    pub register_status: Arc<Mutex<u16>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            registrations: Arc::new(Mutex::new(Vec::new())),
            searches: Arc::new(Mutex::new(Vec::new())),
            search_response: Arc::new(Mutex::new(Vec::new())),
            register_status: Arc::new(Mutex::new(200)),
        }
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }
}

async fn register(
    State(api): State<RecordingApi>,
    Json(request): Json<RegisterWatchlistMemberRequest>,
) -> (StatusCode, String) {
    api.registrations.lock().unwrap().push(request);

    let status = *api.register_status.lock().unwrap();
    let status = StatusCode::from_u16(status).unwrap();
    let body = if status.is_success() {
        String::new()
    } else {
        r#"{"message":"simulated register failure"}"#.to_string()
    };
    (status, body)
}

async fn search(
    State(api): State<RecordingApi>,
    Json(request): Json<SearchInWatchlistRequest>,
) -> Json<Vec<SearchResultGroup>> {
    api.searches.lock().unwrap().push(request);
    Json(api.search_response.lock().unwrap().clone())
}

/// Bind the mock API on an ephemeral port and return its base URL.
pub async fn spawn_mock_api(api: RecordingApi) -> String {
    let app = Router::new()
        .route("/api/v1/WatchlistMembers/Register", post(register))
        .route("/api/v1/Watchlists/Search", post(search))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}
