//! Mock EcoleGest backend and gate fixtures for client tests.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};

use crate::config::{ApiConfig, GateConfig};
use crate::gate::AccessGate;
use crate::net::api::ApiClient;
use crate::redirect::MemoryNavigator;
use crate::session::{Session, User};
use crate::store::MemoryStorage;

pub(crate) struct Harness {
    pub client: ApiClient,
    pub gate: Arc<AccessGate>,
    pub nav: Arc<MemoryNavigator>,
}

/// Gate on `path`, optionally logged in with `roles`, talking to a fresh
/// mock backend.
pub(crate) async fn harness(path: &str, roles: Option<&[&str]>) -> Harness {
    // Several tests share the process; only the first install wins.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let base_url = spawn_backend().await;
    let nav = Arc::new(MemoryNavigator::at(path));
    let gate = Arc::new(AccessGate::new(GateConfig::default(), Arc::new(MemoryStorage::new()), nav.clone()));
    if let Some(roles) = roles {
        let user = User::new("u1", roles.iter().map(|r| (*r).to_owned()).collect());
        gate.store().save(&Session { token: "abc".into(), user }).unwrap();
    }
    let client = ApiClient::new(ApiConfig::with_base_url(&base_url), gate.clone()).unwrap();
    Harness { client, gate, nav }
}

/// Serve the mock backend on an ephemeral port and return its base URL.
pub(crate) async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/eleves", get(eleves))
        .route("/api/classes", post(echo).put(echo).delete(no_content))
        .route("/api/whoami", get(whoami))
        .route("/api/forbidden", get(forbidden))
        .route("/api/expired", get(expired))
        .route("/api/broken", get(broken))
        .route("/api/auth/login", post(login));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn eleves() -> Json<Value> {
    Json(json!([{ "id": 1, "nom": "Sow", "classe": "6eA" }, { "id": 2, "nom": "Fall", "classe": "5eB" }]))
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    Json(json!({ "authorization": auth }))
}

async fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "message": "Acces refuse" }))).into_response()
}

async fn expired() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Token expire" }))).into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (username, password) {
        ("p1", "secret") => Json(json!({
            "token": "jwt-parent",
            "user": { "username": "p1", "roles": ["PARENT"], "nom": "Diallo" }
        }))
        .into_response(),
        ("c1", "secret") => Json(json!({
            "accessToken": "jwt-comptable",
            "type": "Bearer",
            "username": "c1",
            "roles": ["ROLE_COMPTABLE"]
        }))
        .into_response(),
        ("norole", "secret") => Json(json!({ "token": "jwt-x", "user": { "username": "norole", "roles": [] } })).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Identifiants invalides" }))).into_response(),
    }
}
