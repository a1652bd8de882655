use std::sync::Arc;
use axum::{
    extract::State,
    http::{ HeaderMap, HeaderName, HeaderValue },
    routing::{ get, post },
    Json,
    Router,
};
use log::{ info, warn };
use tower_http::cors::{ AllowHeaders, AllowMethods, CorsLayer };

use super::error::ApiError;
use crate::cli::Args;
use crate::history::HistoryStore;
use crate::llm::chat::{ ChatClient, GenerationRequest };
use crate::models::api::{ ChatRequest, ChatResponse, HealthResponse, RootResponse };
use crate::models::chat::{ Conversation, Turn };

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub default_user_id: String,
    pub user_id_header: HeaderName,
    pub commit_on_success: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_user_id: "default_user".to_string(),
            user_id_header: HeaderName::from_static("x-user-id"),
            commit_on_success: false,
        }
    }
}

impl ChatSettings {
    pub fn from_args(args: &Args) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let user_id_header = HeaderName::from_bytes(args.user_id_header.trim().as_bytes()).map_err(|e|
            format!("Invalid USER_ID_HEADER '{}': {}", args.user_id_header, e)
        )?;
        Ok(Self {
            default_user_id: args.default_user_id.clone(),
            user_id_header,
            commit_on_success: args.history_commit_on_success,
        })
    }

    /// Conversation key for a request: the user id header when present, else the default id.
    pub fn resolve_user_id(&self, headers: &HeaderMap) -> String {
        headers
            .get(&self.user_id_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_user_id.clone())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub history: Arc<dyn HistoryStore>,
    pub chat_client: Option<Arc<dyn ChatClient>>,
    pub settings: Arc<ChatSettings>,
}

impl AppState {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        chat_client: Option<Arc<dyn ChatClient>>,
        settings: ChatSettings
    ) -> Self {
        Self {
            history,
            chat_client,
            settings: Arc::new(settings),
        }
    }

    pub fn gemini_configured(&self) -> bool {
        self.chat_client.is_some()
    }
}

pub fn build_cors_layer(origins: &[String], allow_credentials: bool) -> CorsLayer {
    let any_origin = origins.is_empty() || origins.iter().any(|o| o == "*");
    if any_origin {
        // A literal "*" cannot be combined with credentials, so mirror the request instead.
        return if allow_credentials { CorsLayer::very_permissive() } else { CorsLayer::permissive() };
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(allow_credentials)
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/echo", post(echo_handler))
        .layer(cors)
        .with_state(state)
}

async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "🚀 ChatBot Server running".to_string(),
        gemini_configured: state.gemini_configured(),
    })
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        gemini_configured: state.gemini_configured(),
    })
}

async fn echo_handler(Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    Json(ChatResponse::echo(&req.message))
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>
) -> Result<Json<ChatResponse>, ApiError> {
    let client = state.chat_client.as_ref().ok_or(ApiError::NotConfigured)?;
    let user_id = state.settings.resolve_user_id(&headers);
    info!("Chat request: user={} model={}", user_id, req.model);

    let reply = converse(&state, client.as_ref(), &user_id, &req).await?;

    Ok(
        Json(ChatResponse {
            reply,
            model_used: req.model,
            tokens_used: Some(req.max_tokens),
        })
    )
}

async fn converse(
    state: &AppState,
    client: &dyn ChatClient,
    user_id: &str,
    req: &ChatRequest
) -> Result<String, ApiError> {
    let history = &state.history;
    let commit_on_success = state.settings.commit_on_success;
    let user_turn = Turn::user(req.message.clone());

    // Default mode stores the user turn up front; it stays even if Gemini fails.
    let conversation = if commit_on_success {
        let mut conversation = history.get(user_id).await?;
        conversation.push(user_turn);
        conversation
    } else {
        history.append(user_id, user_turn).await?;
        history.get(user_id).await?
    };

    let mut request = GenerationRequest {
        model: req.model.clone(),
        turns: conversation.turns,
        max_tokens: req.max_tokens,
        temperature: req.temperature,
    };
    let reply = client.generate(&request).await?;

    if commit_on_success {
        request.turns.push(Turn::model(reply.clone()));
        history.replace(user_id, Conversation {
            id: user_id.to_string(),
            turns: request.turns,
        }).await?;
    } else {
        history.append(user_id, Turn::model(reply.clone())).await?;
    }

    Ok(reply)
}
