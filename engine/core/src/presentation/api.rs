// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP API
//
// Thin JSON surface over the Engine facade. Errors render as
// {"error": {"kind", "message", "hint"}} with a status derived from the
// error kind.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::application::engine::Engine;
use crate::domain::agent::{AgentId, AgentLearningState, LearningMode};
use crate::domain::error::InferenceError;
use crate::domain::execution::ExecutionRecord;
use crate::domain::inference::{CanonicalInputs, CanonicalResult};
use crate::domain::model::{DescriptorDraft, ExecutionAggregate, ModelDescriptor, ModelId};
use crate::domain::provider::{ProviderEndpoint, ProviderKind};
use crate::domain::repository::PersistenceError;

const DEFAULT_EXECUTIONS_LIMIT: usize = 50;

pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn app(engine: Arc<Engine>) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        .route("/health", get(health))
        .route("/v1/models", get(list_models).post(register_model))
        .route("/v1/models/{id}", get(get_model).delete(deregister_model))
        .route("/v1/models/{id}/stats", get(model_stats))
        .route("/v1/models/{id}/preload", post(preload_model))
        .route("/v1/models/{id}/unload", post(unload_model))
        .route("/v1/models/{id}/inference", post(run_inference))
        .route("/v1/endpoints", get(list_endpoints))
        .route("/v1/endpoints/{name}", put(update_endpoint))
        .route("/v1/agents/{id}", get(get_agent))
        .route("/v1/agents/{id}/mode", put(set_learning_mode))
        .route("/v1/executions", get(list_executions))
        .route("/v1/checkpoint", post(checkpoint))
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    Inference(InferenceError),
    NotFound(String),
    BadRequest(String),
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        ApiError::Inference(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError::Inference(err.into())
    }
}

fn status_for(err: &InferenceError) -> StatusCode {
    match err {
        InferenceError::InvalidDescriptor(_) | InferenceError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        InferenceError::UnsupportedModelType(_) => StatusCode::UNPROCESSABLE_ENTITY,
        InferenceError::ModelUnavailable(_)
        | InferenceError::ModelLoadFailed(_)
        | InferenceError::ProviderInactive(_)
        | InferenceError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        InferenceError::ApiError { .. }
        | InferenceError::ProviderError(_)
        | InferenceError::MissingArtifact(_)
        | InferenceError::EmptyResponse
        | InferenceError::Network(_) => StatusCode::BAD_GATEWAY,
        InferenceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        InferenceError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Inference(err) => (
                status_for(&err),
                json!({
                    "kind": err.kind(),
                    "message": err.to_string(),
                    "hint": err.user_hint(),
                }),
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                json!({"kind": "not_found", "message": message}),
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({"kind": "bad_request", "message": message}),
            ),
        };
        (status, Json(json!({ "error": body }))).into_response()
    }
}

#[derive(Serialize)]
struct ModelView {
    #[serde(flatten)]
    descriptor: ModelDescriptor,
    available: bool,
    loaded: bool,
}

fn model_view(engine: &Engine, descriptor: ModelDescriptor) -> ModelView {
    let registry = engine.registry();
    ModelView {
        available: registry.is_available(&descriptor.id),
        loaded: registry.is_loaded(&descriptor.id),
        descriptor,
    }
}

/// Endpoint without its credentials
#[derive(Serialize)]
struct EndpointView {
    name: String,
    provider: ProviderKind,
    base_url: String,
    timeout_seconds: u64,
    active: bool,
}

impl From<ProviderEndpoint> for EndpointView {
    fn from(endpoint: ProviderEndpoint) -> Self {
        Self {
            active: endpoint.is_active(),
            name: endpoint.name,
            provider: endpoint.provider,
            base_url: endpoint.base_url,
            timeout_seconds: endpoint.timeout_seconds,
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let registry = state.engine.registry();
    Json(json!({
        "status": "ok",
        "models": registry.list().len(),
        "loaded": registry.loaded_models().len(),
    }))
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelView>> {
    let engine = &state.engine;
    Json(
        engine
            .registry()
            .list()
            .into_iter()
            .map(|d| model_view(engine, d))
            .collect(),
    )
}

#[derive(Deserialize)]
pub struct RegisterModelRequest {
    pub id: String,
    #[serde(flatten)]
    pub descriptor: DescriptorDraft,
}

async fn register_model(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterModelRequest>,
) -> Result<(StatusCode, Json<ModelView>), ApiError> {
    let id = ModelId::new(payload.id);
    let descriptor = state.engine.register_model(&id, payload.descriptor).await?;
    Ok((StatusCode::CREATED, Json(model_view(&state.engine, descriptor))))
}

async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ModelView>, ApiError> {
    let descriptor = state
        .engine
        .registry()
        .get(&ModelId::new(id.clone()))
        .ok_or_else(|| ApiError::NotFound(format!("model '{}' is not registered", id)))?;
    Ok(Json(model_view(&state.engine, descriptor)))
}

async fn deregister_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.engine.deregister_model(&ModelId::new(id.clone())).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("model '{}' is not registered", id)))
    }
}

#[derive(Serialize)]
struct ModelStatsResponse {
    model_id: ModelId,
    statistics: ExecutionAggregate,
    recent: Vec<ExecutionRecord>,
}

async fn model_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ModelStatsResponse>, ApiError> {
    let model_id = ModelId::new(id);
    let statistics = state
        .engine
        .get_execution_stats(&model_id)
        .ok_or_else(|| ApiError::NotFound(format!("model '{}' is not registered", model_id)))?;
    let mut recent = state.engine.stats().history_for(&model_id);
    recent.reverse();
    recent.truncate(DEFAULT_EXECUTIONS_LIMIT);

    Ok(Json(ModelStatsResponse {
        model_id,
        statistics,
        recent,
    }))
}

async fn preload_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let loaded = state.engine.registry().preload(&ModelId::new(id))?;
    Ok(Json(json!({ "loaded": loaded })))
}

async fn unload_model(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Json<Value> {
    let unloaded = state.engine.registry().unload(&ModelId::new(id));
    Json(json!({ "unloaded": unloaded }))
}

#[derive(Deserialize)]
pub struct InferenceRequest {
    #[serde(default)]
    pub inputs: Value,
}

async fn run_inference(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<InferenceRequest>,
) -> Result<Json<CanonicalResult>, ApiError> {
    let inputs = CanonicalInputs::try_from(payload.inputs)?;
    let result = state.engine.run_inference(&ModelId::new(id), inputs).await?;
    Ok(Json(result))
}

async fn list_endpoints(State(state): State<Arc<AppState>>) -> Json<Vec<EndpointView>> {
    Json(
        state
            .engine
            .registry()
            .endpoints()
            .into_iter()
            .map(EndpointView::from)
            .collect(),
    )
}

#[derive(Deserialize)]
pub struct UpdateEndpointRequest {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

async fn update_endpoint(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<UpdateEndpointRequest>,
) -> Result<Json<EndpointView>, ApiError> {
    let mut endpoint = state
        .engine
        .registry()
        .endpoint(&name)
        .ok_or_else(|| ApiError::NotFound(format!("endpoint '{}' is not configured", name)))?;

    if let Some(api_key) = payload.api_key {
        endpoint.api_key = api_key;
    }
    if let Some(base_url) = payload.base_url {
        endpoint.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(timeout) = payload.timeout_seconds {
        endpoint.timeout_seconds = timeout;
    }

    state.engine.update_endpoint(endpoint.clone()).await?;
    Ok(Json(endpoint.into()))
}

async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentLearningState>, ApiError> {
    let agent: AgentId = id.parse().map_err(ApiError::BadRequest)?;
    Ok(Json(state.engine.get_agent_state(agent)))
}

#[derive(Deserialize)]
pub struct LearningModeRequest {
    pub mode: LearningMode,
}

async fn set_learning_mode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<LearningModeRequest>,
) -> Result<Json<AgentLearningState>, ApiError> {
    let agent: AgentId = id.parse().map_err(ApiError::BadRequest)?;
    let updated = state.engine.set_learning_mode(agent, payload.mode).await?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct ExecutionsQuery {
    pub limit: Option<usize>,
    pub model: Option<String>,
}

async fn list_executions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExecutionsQuery>,
) -> Json<Vec<ExecutionRecord>> {
    let limit = query.limit.unwrap_or(DEFAULT_EXECUTIONS_LIMIT);
    let stats = state.engine.stats();

    let records = match query.model {
        Some(model) => {
            let mut records = stats.history_for(&ModelId::new(model));
            records.reverse();
            records.truncate(limit);
            records
        }
        None => stats.recent(limit),
    };
    Json(records)
}

async fn checkpoint(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state.engine.checkpoint().await?;
    Ok(Json(json!({ "status": "ok" })))
}
