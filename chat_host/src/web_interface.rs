use crate::ai_client::TurnOverrides;
use crate::conversation_state::ConversationContext;
use crate::dispatcher::{ChatTurnResult, Dispatcher};
use crate::error::DispatchError;
use crate::patterns::CommandHelp;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::HashMap, sync::Arc, time::Instant};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Sessions kept before the least recently used one is dropped.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug, Clone)]
pub struct Session {
    pub context: ConversationContext,
    pub last_used: Instant,
}

#[derive(Clone)]
pub struct WebAppState {
    pub sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
    pub dispatcher: Arc<Dispatcher>,
    max_sessions: usize,
}

impl WebAppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self::with_session_limit(dispatcher, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_session_limit(dispatcher: Arc<Dispatcher>, max_sessions: usize) -> Self {
        WebAppState {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            dispatcher,
            max_sessions: max_sessions.max(1),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Preferred LLM provider for this turn.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    fn overrides(&self) -> TurnOverrides {
        TurnOverrides {
            provider: self.provider.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub turn: ChatTurnResult,
}

pub struct ApiError(DispatchError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            DispatchError::CollaboratorUnavailable { .. } => (
                StatusCode::BAD_GATEWAY,
                "could not get a response".to_string(),
            ),
            DispatchError::MalformedRequest { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
        };
        log::error!("Chat turn failed: {}", self.0);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn create_router(app_state: WebAppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/commands", get(commands))
        .route("/chat/history/:session_id", delete(clear_history))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn chat(
    State(app_state): State<WebAppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = resolve_session_id(request.session_id.clone());
    let context = {
        let sessions = app_state.sessions.lock().await;
        sessions
            .get(&session_id)
            .map(|s| s.context.clone())
            .unwrap_or_default()
    };

    let turn = app_state
        .dispatcher
        .dispatch_with(&request.message, &context, &request.overrides())
        .await
        .map_err(ApiError)?;

    let mut sessions = app_state.sessions.lock().await;
    let session = sessions.entry(session_id).or_insert_with(|| Session {
        context: ConversationContext::new(),
        last_used: Instant::now(),
    });
    session.context.record_turn(&request.message, turn.text());
    session.last_used = Instant::now();
    evict_idle_sessions(&mut sessions, app_state.max_sessions);
    drop(sessions);

    Ok(Json(ChatResponse { session_id, turn }))
}

async fn commands(State(app_state): State<WebAppState>) -> Json<Vec<CommandHelp>> {
    Json(app_state.dispatcher.commands())
}

async fn clear_history(
    State(app_state): State<WebAppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&session_id) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid session id" })));
    };
    app_state.sessions.lock().await.remove(&id);
    (StatusCode::OK, Json(json!({ "message": "Chat history cleared" })))
}

/// Drop least recently used sessions until at most `limit` remain.
fn evict_idle_sessions(sessions: &mut HashMap<Uuid, Session>, limit: usize) {
    while sessions.len() > limit {
        let Some(oldest) = sessions
            .iter()
            .min_by_key(|(_, s)| s.last_used)
            .map(|(id, _)| *id)
        else {
            break;
        };
        sessions.remove(&oldest);
        log::info!("Evicted idle session {}", oldest);
    }
}

fn resolve_session_id(provided: Option<String>) -> Uuid {
    if let Some(sid) = provided {
        if let Ok(parsed) = Uuid::parse_str(&sid) {
            return parsed;
        }
        log::warn!("Ignoring malformed session_id {:?}", sid);
    }
    let new_id = Uuid::new_v4();
    log::info!("Generating new session_id: {}", new_id);
    new_id
}
