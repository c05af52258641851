//! HTTP API server.
//!
//! Provides JSON endpoints for chat, summaries and transcripts.

use crate::assistant::VideoAssistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::conversation::{normalize_history, RawTurn};
use crate::error::VidaskError;
use crate::transcript::{extract_video_id, TimeRangeGroup};
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn};
use uuid::Uuid;

const CHAT_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";
const SUMMARY_CACHE_CONTROL: &str = "public, max-age=3600";
const TRANSCRIPT_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";
const NOT_FOUND_MESSAGE: &str = "Transcript not available";

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let assistant = Arc::new(VideoAssistant::new(&settings)?);
    let app = build_router(assistant);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Vidask API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /api/chat");
    Output::kv("Summary", "POST /api/summary");
    Output::kv("Transcript", "POST /api/transcript");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router around a shared assistant.
pub fn build_router(assistant: Arc<VideoAssistant>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/summary", post(summary))
        .route("/api/transcript", post(transcript))
        .layer(trace)
        .layer(cors)
        .with_state(assistant)
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    history: Option<Vec<RawTurn>>,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Deserialize)]
struct SummaryRequest {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptRequest {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Serialize)]
struct TranscriptResponse {
    title: Option<String>,
    segments: Vec<TimeRangeGroup>,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// An error ready to be sent to the client.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    /// Map a library error, hiding internal details behind `fallback`.
    fn from_error(err: VidaskError, fallback: &str) -> Self {
        match err {
            VidaskError::InvalidInput(message) => Self {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            e if e.is_not_found() => {
                warn!("{}: {}", NOT_FOUND_MESSAGE, e);
                Self {
                    status: StatusCode::NOT_FOUND,
                    message: NOT_FOUND_MESSAGE.to_string(),
                }
            }
            e => {
                error!("{}: {}", fallback, e);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: fallback.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// A present, non-blank field, with URLs reduced to their video ID.
fn video_id_field(value: Option<String>) -> Option<String> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    Some(extract_video_id(&value).unwrap_or_else(|| value.trim().to_string()))
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(
    State(assistant): State<Arc<VideoAssistant>>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let video_id = video_id_field(req.video_id);
    let question = req.question.filter(|q| !q.trim().is_empty());
    let (Some(video_id), Some(question)) = (video_id, question) else {
        return Err(ApiError::bad_request("Missing videoId or question"));
    };

    let history = normalize_history(req.history.as_deref().unwrap_or_default());

    let answer = assistant
        .answer(&video_id, &question, &history)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to process chat request"))?;

    Ok((
        [(header::CACHE_CONTROL, CHAT_CACHE_CONTROL)],
        Json(ChatResponse { answer }),
    )
        .into_response())
}

async fn summary(
    State(assistant): State<Arc<VideoAssistant>>,
    Json(req): Json<SummaryRequest>,
) -> Result<Response, ApiError> {
    let Some(video_id) = video_id_field(req.id) else {
        return Err(ApiError::bad_request("Missing video ID"));
    };

    let summary = assistant
        .summarize(&video_id, true)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to generate summary"))?;

    Ok((
        [(header::CACHE_CONTROL, SUMMARY_CACHE_CONTROL)],
        Json(SummaryResponse { summary }),
    )
        .into_response())
}

async fn transcript(
    State(assistant): State<Arc<VideoAssistant>>,
    Json(req): Json<TranscriptRequest>,
) -> Result<Response, ApiError> {
    let Some(video_id) = video_id_field(req.video_id) else {
        return Err(ApiError::bad_request("Missing video ID"));
    };

    let view = assistant
        .transcript(&video_id)
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to fetch transcript"))?;

    Ok((
        [(header::CACHE_CONTROL, TRANSCRIPT_CACHE_CONTROL)],
        Json(TranscriptResponse {
            title: view.title,
            segments: view.groups,
        }),
    )
        .into_response())
}
