//! HTTP API.
//!
//! - `GET /` banner
//! - `GET /health` index and configuration status
//! - `POST /ask` grounded answer for `{"question": ...}`

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use atlas_assist::{AskError, Assistant};

const BANNER: &str = "<html><body><h3>Atlas Prototype API</h3>\
<p>Use /health and /ask endpoints. Frontend runs separately.</p></body></html>";

#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub index_built: bool,
    pub docs_count: usize,
    pub openai_key_set: bool,
}

pub fn router(assistant: Arc<Assistant>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .layer(CorsLayer::permissive())
        .with_state(AppState { assistant })
}

async fn index_handler() -> Html<&'static str> {
    Html(BANNER)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    let index = state.assistant.index();
    Json(HealthStatus {
        ok: true,
        index_built: index.is_built(),
        docs_count: index.len(),
        openai_key_set: state.assistant.has_chat_model(),
    })
}

/// POST /ask
///
/// The body is read leniently: anything that is not a JSON object with a
/// string `question` counts as an empty question.
async fn ask_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let question = question_from_body(&body);
    match state.assistant.ask(&question).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

fn question_from_body(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("question").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

/// Maps [`AskError`] onto status codes and JSON error bodies.
struct ApiError(AskError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            AskError::EmptyQuestion => (StatusCode::BAD_REQUEST, json!({ "error": self.0.to_string() })),
            AskError::NotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": self.0.to_string() }))
            }
            AskError::Search(detail) => {
                tracing::error!(%detail, "search task failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Search failed", "detail": detail }))
            }
            AskError::Llm(e) => {
                tracing::error!(error = %e, "LLM request failed");
                let mut body = json!({ "error": "LLM request failed", "detail": e.detail() });
                if let Some(status) = e.status() {
                    body["status"] = json!(status);
                }
                (StatusCode::BAD_GATEWAY, body)
            }
        };
        (status, Json(body)).into_response()
    }
}
