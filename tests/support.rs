use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const SLOW_RESPONSE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// Server-side state of the fake API.
#[derive(Default)]
pub struct MockState {
    /// Access token the API accepts.
    pub valid_token: Mutex<String>,
    /// Refresh token the refresh endpoint accepts.
    pub valid_refresh_token: Mutex<String>,
    /// Access token handed out by a successful refresh.
    pub issued_token: Mutex<String>,
    pub refresh_calls: AtomicUsize,
    /// When set, protected routes answer 401 whatever token is presented.
    pub reject_all: AtomicBool,
    pub seen: Mutex<Vec<SeenRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("lock mock state")
}

impl MockState {
    pub fn seen_for(&self, path: &str) -> Vec<SeenRequest> {
        lock(&self.seen)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", lock(&self.valid_token));
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

pub struct MockApi {
    pub base_url: String,
    pub state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockApi {
    pub async fn start(valid_token: &str, valid_refresh_token: &str, issued_token: &str) -> Self {
        let state = Arc::new(MockState::default());
        *lock(&state.valid_token) = valid_token.to_string();
        *lock(&state.valid_refresh_token) = valid_refresh_token.to_string();
        *lock(&state.issued_token) = issued_token.to_string();

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock api");
        let addr = listener.local_addr().expect("mock api addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            task,
        }
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let body_json: Option<Value> = serde_json::from_slice(&body).ok();
    lock(&state.seen).push(SeenRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body_json.clone(),
    });

    match path.as_str() {
        "/refresh-token" => {
            state.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let presented = body_json
                .as_ref()
                .and_then(|v| v.get("refresh_token"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if presented.is_empty() || presented != *lock(&state.valid_refresh_token) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "invalid_grant" })),
                )
                    .into_response();
            }
            let issued = lock(&state.issued_token).clone();
            *lock(&state.valid_token) = issued.clone();
            Json(json!({ "access_token": issued, "token_type": "Bearer" })).into_response()
        }
        "/login" | "/register" | "/public-route/info" => {
            Json(json!({ "public": true })).into_response()
        }
        "/slow" => {
            tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
            Json(json!({ "slow": true })).into_response()
        }
        _ if state.reject_all.load(Ordering::SeqCst) || !state.is_authorized(&headers) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "token expired" })),
        )
            .into_response(),
        _ => Json(json!({ "path": path, "echo": body_json })).into_response(),
    }
}
