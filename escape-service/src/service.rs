use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use escape_flow::{
    ChatSession, ErrorKind, FlowError, InMemorySessionStorage, LoginNotification, Notifier,
    Orchestrator, RecommendationFilter, SessionLocks, SessionStorage,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    config::{ConfigError, ServiceConfig},
    models::{
        AdviceRequest, AdviceResponse, ChatMessageRequest, ChatReplyResponse, ChatSessionResponse,
        ErrorDetail, NotifyResponse, RecommendationsResponse,
    },
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Generic => StatusCode::BAD_GATEWAY,
    }
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub session_storage: Arc<dyn SessionStorage>,
    pub session_locks: SessionLocks,
    pub notifier: Option<Notifier>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            session_storage: Arc::new(InMemorySessionStorage::new()),
            session_locks: SessionLocks::new(),
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

pub fn create_app(config: &ServiceConfig) -> Result<Router, ConfigError> {
    let orchestrator = Orchestrator::new(config.build_model()?).with_retry_policy(config.retry);
    let mut state = AppState::new(orchestrator);
    if let Some(url) = &config.notify_forward_url {
        info!("Forwarding login notifications to {}", url);
        state = state.with_notifier(Notifier::new(url.clone()));
    }
    Ok(build_router(state))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/recommendations", post(recommend))
        .route("/api/advice", post(advice))
        .route("/api/chat/sessions", post(create_chat_session))
        .route("/api/chat/sessions/{session_id}", get(get_chat_session))
        .route("/api/chat/sessions/{session_id}/messages", post(send_chat_message))
        .route("/api/auth/notify", post(notify_login))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Escape Zone",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Entertainment recommendations, career advice and chat backed by a generative model",
        "endpoints": {
            "POST /api/recommendations": "Recommendations for a category and optional genre, year and query",
            "POST /api/advice": "Markdown roadmap for a topic",
            "POST /api/chat/sessions": "Start a chat session",
            "GET /api/chat/sessions/{session_id}": "Chat transcript",
            "POST /api/chat/sessions/{session_id}/messages": "Send a chat message",
            "POST /api/auth/notify": "Login notification",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn recommend(
    State(state): State<AppState>,
    Json(filter): Json<RecommendationFilter>,
) -> (StatusCode, Json<RecommendationsResponse>) {
    info!(
        category = %filter.category,
        genre = ?filter.genre,
        year = ?filter.year,
        "Recommendation request"
    );

    let (items, failure) = state.orchestrator.recommendations_or_message(&filter).await;
    let status = failure
        .map(|(kind, _)| status_for(kind))
        .unwrap_or(StatusCode::OK);

    (
        status,
        Json(RecommendationsResponse {
            items: items.as_ref().clone(),
            error: failure.map(|(kind, message)| ErrorDetail {
                kind,
                message: message.to_string(),
            }),
        }),
    )
}

async fn advice(
    State(state): State<AppState>,
    Json(request): Json<AdviceRequest>,
) -> ApiResult<AdviceResponse> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(bad_request_error("Topic is required"));
    }
    info!(topic, "Advice request");

    let (content, kind) = state.orchestrator.advice_or_message(topic).await;
    let error = kind.map(|kind| ErrorDetail {
        kind,
        message: content.clone(),
    });
    Ok(Json(AdviceResponse {
        topic: topic.to_string(),
        content,
        error,
    }))
}

async fn create_chat_session(State(state): State<AppState>) -> ApiResult<ChatSessionResponse> {
    let session = ChatSession::new();
    let response = ChatSessionResponse {
        session_id: session.id.clone(),
        transcript: session.transcript().to_vec(),
    };

    save_session(&state, session).await?;
    info!("Chat session {} created", response.session_id);
    Ok(Json(response))
}

async fn load_session(state: &AppState, session_id: &str) -> Result<ChatSession, ApiError> {
    match state.session_storage.load(session_id).await {
        Ok(session) => Ok(session),
        Err(FlowError::SessionNotFound(_)) => {
            Err(not_found_error("Session not found", session_id))
        }
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

async fn save_session(state: &AppState, session: ChatSession) -> Result<(), ApiError> {
    state.session_storage.save(session).await.map_err(|e| {
        error!("Failed to save session: {}", e);
        internal_error("Failed to save chat session", &e.to_string())
    })
}

async fn get_chat_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ChatSessionResponse> {
    let session = load_session(&state, &session_id).await?;
    Ok(Json(ChatSessionResponse {
        session_id,
        transcript: session.transcript().to_vec(),
    }))
}

async fn send_chat_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatMessageRequest>,
) -> ApiResult<ChatReplyResponse> {
    if request.message.trim().is_empty() {
        return Err(bad_request_error("Message cannot be empty"));
    }

    // Turns on one session run one at a time; the guard spans load to save.
    let _turn = state.session_locks.lock(&session_id).await;
    let mut session = load_session(&state, &session_id).await?;
    let reply = session.send(&state.orchestrator, request.message).await;
    if let Some(kind) = reply.error {
        warn!(session_id = %session_id, ?kind, "Chat turn resolved to an error message");
    }

    let response = ChatReplyResponse {
        session_id,
        reply: reply.turn,
        transcript: session.transcript().to_vec(),
        error: reply.error,
    };
    save_session(&state, session).await?;
    Ok(Json(response))
}

async fn notify_login(
    State(state): State<AppState>,
    Json(notification): Json<LoginNotification>,
) -> Json<NotifyResponse> {
    info!(
        subject = %notification.subject(),
        "{}",
        notification.body()
    );

    let message = match &state.notifier {
        Some(notifier) => {
            notifier.notify(notification);
            "Notification forwarded"
        }
        None => {
            warn!("Notification forwarding not configured. Logged only.");
            "Notification logged"
        }
    };

    Json(NotifyResponse {
        success: true,
        message: message.to_string(),
    })
}
