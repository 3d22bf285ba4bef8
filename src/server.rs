//! HTTP surface consumed by the CharacterKB UI.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check |
//! | `POST` | `/images` | Resolve a fixed-size gallery for one character |
//! | `POST` | `/search` | Backend search, optionally with best-match images |
//! | `POST` | `/chat` | Chat pass-through |
//! | `POST` | `/insights` | Insights pass-through |
//!
//! Errors are returned as `{"detail": "..."}`. `/images` never fails.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::{BackendClient, BackendError};
use crate::models::{
    CharacterIdentity, ChatRequest, ImagesRequest, InsightsRequest, SearchRequest, SearchResponse,
    TextResponse,
};
use crate::resolver::{ImageResolver, ResolveOptions, MAX_GALLERY_SIZE};

#[derive(Clone)]
pub struct AppState {
    pub resolver: ImageResolver,
    pub backend: BackendClient,
    pub options: ResolveOptions,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/images", post(images_endpoint))
        .route("/search", post(search_endpoint))
        .route("/chat", post(chat_endpoint))
        .route("/insights", post(insights_endpoint))
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn images_endpoint(State(state): State<AppState>, Json(req): Json<ImagesRequest>) -> Response {
    let mut options = state.options;
    if let Some(max_results) = req.max_results {
        options.max_results = max_results.clamp(1, MAX_GALLERY_SIZE);
    }
    let identity = CharacterIdentity::new(req.character_name, req.genre);
    let images = state.resolver.resolve(&identity, &options).await;
    (StatusCode::OK, Json(images)).into_response()
}

async fn search_endpoint(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> Response {
    let results = match state.backend.search(&req.query, req.media_type.as_deref()).await {
        Ok(results) => results,
        Err(e) => return backend_error_response(e),
    };

    // Only the best match gets a gallery.
    let best_match_images = match results.first() {
        Some(best) if req.with_images => state.resolver.resolve(&best.identity(), &state.options).await,
        _ => Vec::new(),
    };

    let response = SearchResponse {
        results,
        best_match_images,
    };
    (StatusCode::OK, Json(response)).into_response()
}

async fn chat_endpoint(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    match state
        .backend
        .chat(&req.character_name, &req.character_description, &req.question)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(TextResponse { response })).into_response(),
        Err(e) => backend_error_response(e),
    }
}

async fn insights_endpoint(State(state): State<AppState>, Json(req): Json<InsightsRequest>) -> Response {
    match state
        .backend
        .insights(&req.character_name, &req.character_description)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(TextResponse { response })).into_response(),
        Err(e) => backend_error_response(e),
    }
}

fn backend_error_response(e: BackendError) -> Response {
    let (status, detail) = match &e {
        BackendError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        BackendError::NoMatches => (
            StatusCode::NOT_FOUND,
            "No matching characters found. Try a different description or remove filters."
                .to_string(),
        ),
        BackendError::Upstream { detail, .. } => (StatusCode::BAD_GATEWAY, detail.clone()),
        BackendError::Request(msg) => (
            StatusCode::BAD_GATEWAY,
            format!("Backend request failed: {}", msg),
        ),
    };
    tracing::warn!(error = %e, status = status.as_u16(), "backend call failed");
    (status, Json(json!({"detail": detail}))).into_response()
}
