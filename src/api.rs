use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    app_state::{AppState, Status},
    chat::ChatSession,
    dashboard::{self, DataView, ExploreView, FilterOptions, ViewQuery, VisualizationsView},
    dataset::Dataset,
};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

// --- Payloads ---

#[derive(Deserialize)]
pub struct ChatMessagePayload {
    #[serde(alias = "message", alias = "content")]
    frase: String,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/filters", get(filters_handler))
        .route("/api/views/data", get(data_view_handler))
        .route("/api/views/explore", get(explore_view_handler))
        .route("/api/views/visualizations", get(visualizations_view_handler))
        .route("/api/chat/sessions", post(create_session_handler))
        .route(
            "/api/chat/:id",
            get(get_session_handler).delete(end_session_handler),
        )
        .route("/api/chat/:id/messages", post(submit_message_handler))
        .route("/api/chat/:id/reset", post(reset_session_handler))
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Dataset y vistas ---

async fn load_dataset(state: &AppState) -> Result<Arc<Dataset>, ApiError> {
    let path = state.config.classified_reviews_path();
    state.datasets.get_async(&path).await.map_err(|e| {
        error!("Error cargando el dataset {}: {:#}", path.display(), e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error al cargar el dataset: {e}"),
        )
    })
}

fn session_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Sesión de chat no encontrada")
}

fn bad_filters(e: anyhow::Error) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, e.to_string())
}

#[axum::debug_handler]
async fn filters_handler(
    State(state): State<AppState>,
) -> Result<Json<FilterOptions>, ApiError> {
    let dataset = load_dataset(&state).await?;
    Ok(Json(dashboard::filter_options(&dataset)))
}

#[axum::debug_handler]
async fn data_view_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<DataView>, ApiError> {
    let dataset = load_dataset(&state).await?;
    dashboard::data_view(&dataset, &query).map(Json).map_err(bad_filters)
}

#[axum::debug_handler]
async fn explore_view_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ExploreView>, ApiError> {
    let dataset = load_dataset(&state).await?;
    dashboard::explore_view(&dataset, &query).map(Json).map_err(bad_filters)
}

#[axum::debug_handler]
async fn visualizations_view_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<VisualizationsView>, ApiError> {
    let dataset = load_dataset(&state).await?;
    dashboard::visualizations_view(&dataset, &query)
        .map(Json)
        .map_err(bad_filters)
}

// --- Analista de sentimiento (chat) ---

#[axum::debug_handler]
async fn create_session_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(state.sessions.create()))
}

#[axum::debug_handler]
async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatSession>, ApiError> {
    state.sessions.get(id).map(Json).ok_or_else(session_not_found)
}

#[axum::debug_handler]
async fn submit_message_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChatMessagePayload>,
) -> Result<Json<ChatSession>, ApiError> {
    let phrase = payload.frase.trim();
    if phrase.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "La frase no puede estar vacía."));
    }
    state
        .sessions
        .submit(id, phrase, &state.classifier)
        .await
        .map(Json)
        .ok_or_else(session_not_found)
}

#[axum::debug_handler]
async fn reset_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatSession>, ApiError> {
    state.sessions.reset(id).map(Json).ok_or_else(session_not_found)
}

#[axum::debug_handler]
async fn end_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.sessions.end(id) {
        info!("Sesión de chat finalizada: {id}");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Estado y apagado ---

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<Status> {
    let path = state.config.classified_reviews_path();
    Json(Status {
        dataset_available: path.is_file(),
        dataset_path: path.display().to_string(),
        sentiment_backend: state.config.sentiment_backend.as_str().to_string(),
        model_loaded: state.classifier.is_loaded(),
        active_sessions: state.sessions.len(),
    })
}

#[axum::debug_handler]
async fn shutdown_handler(
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}
