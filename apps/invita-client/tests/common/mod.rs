//! Shared mock backend for integration tests: a real axum server bound to
//! 127.0.0.1:0 that the client talks to over the wire.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use invita_client::api::ApiGateway;
use invita_client::config::Config;
use invita_client::nav::RecordingNavigator;
use invita_client::store::{MemoryStore, Session, SessionStore};

/// How the mock `/auth/refresh` endpoint behaves.
#[derive(Clone)]
pub enum RefreshMode {
    /// Succeed and hand out this new token.
    Succeed(String),
    /// Reject the refresh.
    Fail,
}

#[derive(Default)]
pub struct Counters {
    pub refresh_calls: AtomicUsize,
    pub feed_calls: AtomicUsize,
    pub reaction_calls: AtomicUsize,
}

#[derive(Clone)]
pub struct MockState {
    /// The only bearer token the protected endpoints accept.
    pub valid_token: String,
    pub refresh: RefreshMode,
    pub counters: Arc<Counters>,
}

fn bearer_of(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn refresh_handler(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.counters.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // The refresh endpoint is cookie-authenticated; a bearer header here
    // would mean the gateway leaked the stale credential.
    assert!(
        bearer_of(&headers).is_none(),
        "refresh must not carry a bearer header"
    );
    match &state.refresh {
        RefreshMode::Succeed(token) => Json(json!({ "accessToken": token })).into_response(),
        RefreshMode::Fail => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "refresh cookie invalid" })),
        )
            .into_response(),
    }
}

async fn feed_handler(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.counters.feed_calls.fetch_add(1, Ordering::SeqCst);
    if bearer_of(&headers) != Some(state.valid_token.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "feedData": [
            {
                "_id": "inv_1",
                "eventName": "Launch Party",
                "createdByEmail": "host@example.com",
                "reactions": {
                    "cheer": { "count": 3, "users": ["a@example.com"] }
                }
            }
        ]
    }))
    .into_response()
}

async fn reaction_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.counters.reaction_calls.fetch_add(1, Ordering::SeqCst);
    if bearer_of(&headers) != Some(state.valid_token.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let kind = body["reactionType"].as_str().unwrap_or_default().to_string();
    let email = body["userEmail"].as_str().unwrap_or_default().to_string();
    Json(json!({
        "invitation": {
            "reactions": {
                (kind): { "count": 4, "users": [email] }
            }
        }
    }))
    .into_response()
}

async fn missing_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "no such invitation" })),
    )
        .into_response()
}

/// Start the mock backend. The server runs in the background.
pub async fn start_backend(state: MockState) -> SocketAddr {
    let app = Router::new()
        .route("/auth/refresh", post(refresh_handler))
        .route("/invitations/feed/data", get(feed_handler))
        .route("/invitations/{id}/reaction", post(reaction_handler))
        .route("/invitations/{id}", get(missing_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub fn mock_state(valid_token: &str, refresh: RefreshMode) -> MockState {
    MockState {
        valid_token: valid_token.to_string(),
        refresh,
        counters: Arc::new(Counters::default()),
    }
}

pub fn test_config(addr: SocketAddr) -> Config {
    Config {
        api_url: format!("http://{addr}"),
        gateway_host: addr.to_string(),
        entry_path: "/".to_string(),
        landing_path: "/home".to_string(),
        store_path: "unused".to_string(),
        fallback_delay_ms: 50,
    }
}

/// Build a gateway wired to a fresh in-memory store and recording navigator.
pub fn make_gateway(
    addr: SocketAddr,
) -> (Arc<MemoryStore>, Arc<RecordingNavigator>, ApiGateway) {
    let store = Arc::new(MemoryStore::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let gateway = ApiGateway::new(&test_config(addr), store.clone(), navigator.clone())
        .expect("build gateway");
    (store, navigator, gateway)
}

pub fn sign_in(store: &dyn SessionStore, token: &str) {
    store.set_session(Session {
        access_token: token.to_string(),
        email: "me@example.com".to_string(),
        name: Some("Me".to_string()),
        picture: None,
    });
}
