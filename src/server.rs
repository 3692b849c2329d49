//! HTTP server for the PDF chat service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/sessions/upload` | Multipart PDF upload; creates a session |
//! | `POST` | `/sessions/{session_id}/chat` | Ask a question within a session |
//!
//! # Error Contract
//!
//! All error responses share one JSON envelope:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `upstream` (502),
//! `internal` (500).
//!
//! # CORS
//!
//! Allowed origins come from `[server].allowed_origins`; `"*"` permits any
//! origin for browser-based clients.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::chat;
use crate::config::Config;
use crate::embedding::{self, Embedder};
use crate::extract;
use crate::ingest;
use crate::llm::{ChatModel, OpenAiChatClient};
use crate::models::{ChatMessage, ChatTurn};
use crate::session::SessionStore;

/// Upper bound on a multipart upload body. PDFs routinely exceed axum's
/// 2 MB default.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    sessions: Arc<SessionStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated. Fails fast if the embedding or LLM clients cannot
/// be constructed (e.g. a missing API key).
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let embedder: Arc<dyn Embedder> = Arc::from(embedding::create_embedder(&config.embedding)?);
    let llm: Arc<dyn ChatModel> = Arc::new(OpenAiChatClient::new(&config.llm)?);

    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionStore::new()),
        embedder,
        llm,
    };

    let cors = build_cors(&config.server.allowed_origins)?;

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/sessions/upload", post(handle_upload))
        .route("/sessions/{session_id}/chat", post(handle_chat))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state);

    println!("pdf-chat server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.iter().any(|o| o == "*") {
        return Ok(cors.allow_origin(Any));
    }
    let origins = allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("invalid allowed origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(cors.allow_origin(origins))
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn upstream_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Inspects pipeline errors and maps them to the most appropriate HTTP
/// status. This keeps the pipelines on plain `anyhow` errors while client
/// mistakes (bad upload, unknown session, empty message) still produce 4xx.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);

    if msg.contains("not found") {
        not_found(msg)
    } else if msg.contains("must not be empty")
        || msg.contains("no readable text")
        || msg.contains("at least one PDF")
        || msg.contains("not a PDF")
        || msg.contains("unsupported content-type")
        || msg.contains("extraction failed")
    {
        bad_request(msg)
    } else if msg.contains("API error") || msg.contains("connection error") {
        upstream_error(msg)
    } else {
        internal_error(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /sessions/upload ============

/// JSON response body for a successful upload.
#[derive(Serialize)]
struct UploadResponse {
    session_id: String,
    documents: usize,
    chunks: usize,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Handler for `POST /sessions/upload`.
///
/// Accepts one or more multipart parts containing PDF bytes. Parts with a
/// non-PDF content type are rejected; so are uploads from which no text can
/// be extracted.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        let content_type = field
            .content_type()
            .unwrap_or(extract::MIME_OCTET_STREAM)
            .to_string();
        if !extract::accepts(&content_type) {
            return Err(bad_request(format!(
                "only PDF files are supported (got {})",
                content_type
            )));
        }

        let name = field
            .file_name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("upload-{}.pdf", files.len() + 1));
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload {}: {}", name, e)))?;
        files.push((name, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(bad_request("upload at least one PDF"));
    }

    let outcome = ingest::create_session(
        &state.config,
        state.embedder.as_ref(),
        &state.sessions,
        &files,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(UploadResponse {
        session_id: outcome.session_id,
        documents: outcome.documents,
        chunks: outcome.chunks,
        created_at: outcome.created_at,
    }))
}

// ============ POST /sessions/{session_id}/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

/// JSON response body for a chat turn: the answer plus the full history as
/// flat role/content messages.
#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    history: Vec<ChatMessage>,
}

fn flatten_history(history: Vec<ChatTurn>) -> Vec<ChatMessage> {
    history
        .into_iter()
        .flat_map(|turn| [ChatMessage::user(turn.user), ChatMessage::assistant(turn.assistant)])
        .collect()
}

/// Handler for `POST /sessions/{session_id}/chat`.
async fn handle_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let outcome = chat::answer_question(
        &state.config,
        state.embedder.as_ref(),
        state.llm.as_ref(),
        &state.sessions,
        &session_id,
        &payload.message,
    )
    .await
    .map_err(classify_error)?;

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        history: flatten_history(outcome.history),
    }))
}
