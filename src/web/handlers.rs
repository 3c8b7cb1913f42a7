//! HTTP handlers for the web UI

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    Json,
};
use chrono::{DateTime, Local, Utc};
use futures::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::state::AppState;
use crate::backend::BackendStatus;
use crate::chat::{Attachment, ChatError, ChatTurn, Role, Submission, TurnObserver};

/// A chat turn as the browser renders it
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub role: Role,
    pub content: String,
    pub attached_file_name: Option<String>,
    /// Rendered evaluation sections, for evaluated turns
    pub html: Option<String>,
    /// Clipboard payload, for evaluated turns
    pub copy_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ChatTurn> for TurnView {
    fn from(turn: &ChatTurn) -> Self {
        let formatted = turn.formatted();
        let html = formatted.as_ref().and_then(|f| match f.render_html() {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Failed to render evaluation: {}", e);
                None
            }
        });

        TurnView {
            role: turn.role(),
            content: turn.content().to_string(),
            attached_file_name: turn.attached_file_name().map(str::to_string),
            html,
            copy_text: formatted.map(|f| f.plain_text()),
            created_at: turn.created_at(),
        }
    }
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// Response for clearing a session
#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub cleared: usize,
}

impl From<ChatError> for StatusCode {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ChatError::Busy(_) => StatusCode::CONFLICT,
            // Decode failures become error turns inside the controller and
            // never reach a handler; the arm keeps the match exhaustive.
            ChatError::Decode(_) => StatusCode::BAD_REQUEST,
        }
    }
}

// ============================================================================
// Page Handlers (HTML)
// ============================================================================

/// Chat page
pub async fn index() -> Response {
    Html(include_str!("../../templates/index.html")).into_response()
}

// ============================================================================
// API Handlers (JSON)
// ============================================================================

/// Health check endpoint for the UI server itself
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "writing-coach-ui"
    }))
}

/// Online/offline/error status of the evaluation backend
pub async fn backend_status(State(state): State<Arc<AppState>>) -> Json<BackendStatus> {
    Json(state.backend.probe().await)
}

/// Start a new chat session
pub async fn create_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.create_session().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

/// End a chat session
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> StatusCode {
    if state.remove_session(&session_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// All turns of a session, in display order. 409 while a turn is running.
pub async fn list_turns(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<TurnView>>, StatusCode> {
    let controller = state.claim(&session_id).await?;
    let turns = controller.session().turns().iter().map(TurnView::from).collect();
    Ok(Json(turns))
}

/// Empty a session's history
pub async fn clear_turns(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ClearedResponse>, StatusCode> {
    let cleared = state.claim(&session_id).await?.clear();
    Ok(Json(ClearedResponse { cleared }))
}

/// Download the session as a text transcript
pub async fn export_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, StatusCode> {
    let transcript = state.claim(&session_id).await?.session().export(Local::now());

    let disposition = format!("attachment; filename=\"{}\"", transcript.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        transcript.body,
    )
        .into_response())
}

/// Submit a turn (multipart `text` and optional `file`).
///
/// Progress is streamed as server-sent events: `user`, `reveal` frames,
/// `assistant`, then `done`. The turn runs to completion even if the client
/// goes away.
pub async fn submit_turn(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let submission = read_submission(multipart).await?;
    let mut controller = state.begin_turn(&session_id).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut observer = EventObserver { tx: tx.clone() };
        controller.submit(submission, &mut observer).await;
        let _ = tx.send(Event::default().event("done").data("{}"));
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<Event, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, StatusCode> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Failed to read multipart field: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                submission.text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    warn!("Failed to read upload {}: {}", file_name, e);
                    StatusCode::PAYLOAD_TOO_LARGE
                })?;
                // Browsers send an empty part when no file was picked
                if !file_name.is_empty() {
                    submission.attachment = Some(Attachment::new(
                        &file_name,
                        mime_type.as_deref(),
                        bytes.to_vec(),
                    ));
                }
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(submission)
}

/// Forwards turn progress to the SSE stream
struct EventObserver {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventObserver {
    fn send_turn(&self, name: &str, turn: &ChatTurn) {
        match Event::default().event(name).json_data(TurnView::from(turn)) {
            Ok(event) => {
                let _ = self.tx.send(event);
            }
            Err(e) => warn!("Failed to encode {} event: {}", name, e),
        }
    }
}

impl TurnObserver for EventObserver {
    fn user_turn(&mut self, turn: &ChatTurn) {
        self.send_turn("user", turn);
    }

    fn reveal(&mut self, partial: &str) {
        let _ = self.tx.send(Event::default().event("reveal").data(partial));
    }

    fn assistant_turn(&mut self, turn: &ChatTurn) {
        self.send_turn("assistant", turn);
    }
}
