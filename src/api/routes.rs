use anyhow::{anyhow, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    arbitrage::{ArbitrageService, ExecutionOutcome, OrderSpec},
    bot::{BotStatus, MonitorSupervisor, StartOutcome, StopOutcome},
    config::{ServerConfig, StoreConfig},
    database::{ConfigPatch, JournalKind, JournalRepository, OpportunityPatch, StatsSummary},
    error::ServiceError,
    remote::RemoteEntityClient,
    types::{ExecutionStats, MonitoringConfig, Opportunity},
};

use super::error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: ArbitrageService,
    pub journal: Arc<JournalRepository>,
    pub monitor: Arc<MonitorSupervisor>,
    pub remote: Option<Arc<RemoteEntityClient>>,
    pub store_config: Arc<StoreConfig>,
}

/// Create the API router. Routes are served both at the root (where the
/// dashboard calls them) and under `/api/v1`.
pub fn create_router(state: AppState, server: &ServerConfig) -> Result<Router> {
    Ok(Router::new()
        .route("/health", get(health_check))
        .merge(api_routes())
        .nest("/api/v1", api_routes())
        .layer(cors_layer(server)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/arbitrage-opportunities", get(list_opportunities).post(create_opportunity))
        .route("/arbitrage-opportunities/:id/execute", post(execute_opportunity))
        .route(
            "/monitoring-configs",
            get(list_configs).post(create_config).put(replace_configs),
        )
        .route("/monitoring-configs/:id", patch(update_config))
        .route("/stats", get(get_stats))
        .route("/stats/executions", get(get_execution_stats))
        .route("/bot-status", get(get_bot_status).post(set_bot_status))
        .route("/start-bot", post(start_bot))
        .route("/stop-bot", post(stop_bot))
        .route("/bot-logs", get(list_bot_logs).post(append_bot_log))
        .route("/executions", get(list_executions).post(append_execution))
        .route("/remote/arbitrage-opportunities", get(remote_opportunities))
        .route("/remote/arbitrage-opportunities/:id", put(remote_update_opportunity))
        .route("/remote/monitoring-configs", get(remote_configs))
}

fn cors_layer(server: &ServerConfig) -> Result<CorsLayer> {
    let allow_origin = if server.cors_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins = server
            .cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| anyhow!("Invalid CORS origin {}: {}", origin, e))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
        .max_age(Duration::from_secs(server.cors_max_age_seconds)))
}

// ===== Route Handlers =====

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "ArbiBot Pro API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_opportunities(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<OpportunityQuery>, ApiError>,
) -> Result<Json<Vec<Opportunity>>, ApiError> {
    let order = match params.order.as_deref() {
        Some(order) => order.parse::<OrderSpec>()?,
        None => OrderSpec::default(),
    };
    let limit = params.limit.unwrap_or(state.store_config.default_limit);

    let opportunities = state
        .service
        .get_opportunities(&order, limit, params.status.as_deref())?;

    Ok(Json(opportunities))
}

async fn create_opportunity(
    State(state): State<AppState>,
    WithRejection(Json(opportunity), _): WithRejection<Json<Opportunity>, ApiError>,
) -> Result<Json<Opportunity>, ApiError> {
    let stored = state.service.insert_opportunity(opportunity)?;
    Ok(Json(stored))
}

async fn execute_opportunity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ActionResponse>) {
    match state.service.execute(&id).await {
        ExecutionOutcome::Executed(_) => (StatusCode::OK, ActionResponse::succeeded("Arbitrage executed")),
        ExecutionOutcome::AlreadyExecuted => (
            StatusCode::CONFLICT,
            ActionResponse::failed(format!("Opportunity {} was already executed", id)),
        ),
        ExecutionOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            ActionResponse::failed(format!("Opportunity {} not found", id)),
        ),
    }
}

async fn list_configs(State(state): State<AppState>) -> Json<Vec<MonitoringConfig>> {
    Json(state.service.get_configs())
}

async fn create_config(
    State(state): State<AppState>,
    WithRejection(Json(config), _): WithRejection<Json<MonitoringConfig>, ApiError>,
) -> Result<Json<MonitoringConfig>, ApiError> {
    let stored = state.service.create_config(config)?;
    persist_configs(&state).await;
    Ok(Json(stored))
}

async fn replace_configs(
    State(state): State<AppState>,
    WithRejection(Json(configs), _): WithRejection<Json<Vec<MonitoringConfig>>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let stored = state.service.replace_configs(configs)?;
    persist_configs(&state).await;
    Ok(ActionResponse::succeeded(format!("Stored {} monitoring configs", stored.len())))
}

async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(patch), _): WithRejection<Json<ConfigPatch>, ApiError>,
) -> Result<Json<MonitoringConfig>, ApiError> {
    let updated = state
        .service
        .update_config(&id, patch)?
        .ok_or_else(|| ServiceError::not_found("Config", id.as_str()))?;
    persist_configs(&state).await;
    Ok(Json(updated))
}

async fn get_stats(State(state): State<AppState>) -> Json<StatsSummary> {
    Json(state.service.get_stats())
}

async fn get_execution_stats(State(state): State<AppState>) -> Json<ExecutionStats> {
    Json(state.service.execution_stats())
}

async fn get_bot_status(State(state): State<AppState>) -> Json<BotStatus> {
    Json(state.monitor.status().await)
}

async fn set_bot_status(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<BotStatusRequest>, ApiError>,
) -> Result<Json<BotStatusResponse>, ApiError> {
    let active = request
        .active
        .ok_or_else(|| ApiError::BadRequest("Missing 'active' field".to_string()))?;
    let status = state.monitor.set_active(active);

    Ok(Json(BotStatusResponse {
        success: true,
        active: status.active,
    }))
}

async fn start_bot(State(state): State<AppState>) -> Json<ActionResponse> {
    match state.monitor.start().await {
        Ok(StartOutcome::Started { .. }) => ActionResponse::succeeded("Monitor started"),
        Ok(StartOutcome::AlreadyRunning) => ActionResponse::failed("Monitor is already running"),
        Err(e) => {
            warn!("Failed to start monitor: {}", e);
            ActionResponse::failed(e.to_string())
        }
    }
}

async fn stop_bot(State(state): State<AppState>) -> Json<ActionResponse> {
    match state.monitor.stop().await {
        Ok(StopOutcome::Stopped) => ActionResponse::succeeded("Monitor stopped"),
        Ok(StopOutcome::NotRunning) => ActionResponse::failed("Monitor was not running"),
        Err(e) => {
            warn!("Failed to stop monitor: {}", e);
            ActionResponse::failed(e.to_string())
        }
    }
}

async fn list_bot_logs(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.journal.load_entries(JournalKind::BotLogs).await?))
}

async fn append_bot_log(
    State(state): State<AppState>,
    WithRejection(Json(entry), _): WithRejection<Json<Value>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    append_journal_entry(&state, JournalKind::BotLogs, entry).await
}

async fn list_executions(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.journal.load_entries(JournalKind::Executions).await?))
}

async fn append_execution(
    State(state): State<AppState>,
    WithRejection(Json(entry), _): WithRejection<Json<Value>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    append_journal_entry(&state, JournalKind::Executions, entry).await
}

async fn remote_opportunities(State(state): State<AppState>) -> Result<Json<Vec<Opportunity>>, ApiError> {
    Ok(Json(remote_client(&state)?.list_opportunities().await?))
}

async fn remote_update_opportunity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(patch), _): WithRejection<Json<OpportunityPatch>, ApiError>,
) -> Result<Json<Opportunity>, ApiError> {
    Ok(Json(remote_client(&state)?.update_opportunity(&id, &patch).await?))
}

async fn remote_configs(State(state): State<AppState>) -> Result<Json<Vec<MonitoringConfig>>, ApiError> {
    Ok(Json(remote_client(&state)?.list_configs().await?))
}

// ===== Helpers =====

async fn append_journal_entry(
    state: &AppState,
    kind: JournalKind,
    entry: Value,
) -> Result<Json<ActionResponse>, ApiError> {
    if !entry.is_object() {
        return Err(ApiError::BadRequest("Journal entries must be JSON objects".to_string()));
    }

    let retained = state.journal.append_entry(kind, entry).await?;
    Ok(ActionResponse::succeeded(format!("{} entries retained", retained)))
}

/// Config changes are written through to the journal; a failed write is logged
/// and does not undo the in-memory change.
async fn persist_configs(state: &AppState) {
    let service = &state.service;
    match state.journal.save_configs_snapshot(|| service.get_configs()).await {
        Ok(count) => info!("Persisted {} monitoring configs", count),
        Err(e) => warn!("Failed to persist monitoring configs: {}", e),
    }
}

fn remote_client(state: &AppState) -> Result<&RemoteEntityClient, ApiError> {
    state
        .remote
        .as_deref()
        .ok_or_else(|| ServiceError::Unavailable("Remote backend is not configured".to_string()).into())
}

// ===== Request/Response Types =====

#[derive(Debug, Deserialize)]
struct OpportunityQuery {
    /// Field name, `-` prefix for descending
    order: Option<String>,
    limit: Option<usize>,
    /// Status label or `all`
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotStatusRequest {
    active: Option<bool>,
}

#[derive(Debug, Serialize)]
struct BotStatusResponse {
    success: bool,
    active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    fn succeeded(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }

    fn failed(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.into(),
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}
