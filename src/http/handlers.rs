//! Request handlers for the matchmaking API

use super::protocol::*;
use super::HttpState;
use crate::error::MatchmakingError;
use crate::service::health::{HealthCheck, HealthStatus};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use tracing::{debug, error};

/// Engine failure rendered as an HTTP error
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0.downcast_ref::<MatchmakingError>() {
            Some(err) if err.is_caller_error() => {
                let status = match err {
                    MatchmakingError::Validation { .. } => StatusCode::BAD_REQUEST,
                    _ => StatusCode::NOT_FOUND,
                };
                debug!("Rejected request: {}", err);
                (
                    status,
                    ErrorResponse {
                        error_code: err.code(),
                        error_message: err.to_string(),
                    },
                )
            }
            _ => {
                error!("Request failed: {:#}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_code: None,
                        error_message: "Internal server error".to_string(),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub async fn list_servers(State(state): State<HttpState>) -> ApiResult<ServersResponse> {
    let servers = state.matchmaker.list_servers().await?;
    Ok(Json(ServersResponse {
        servers: servers.into_iter().map(ServerListing::from).collect(),
    }))
}

pub async fn list_queue(State(state): State<HttpState>) -> ApiResult<QueueResponse> {
    let players = state.matchmaker.list_queue().await?;
    Ok(Json(QueueResponse {
        players: players.into_iter().map(QueueListing::from).collect(),
    }))
}

pub async fn register(
    State(state): State<HttpState>,
    Json(request): Json<RegisterServerRequest>,
) -> ApiResult<RegisterResponse> {
    let id = state.matchmaker.register(request.into()).await?;
    Ok(Json(RegisterResponse { id }))
}

pub async fn deregister(
    State(state): State<HttpState>,
    Json(request): Json<ServerIdRequest>,
) -> ApiResult<RemovedResponse> {
    let removed_id = state.matchmaker.deregister(&request.id).await?;
    Ok(Json(RemovedResponse { removed_id }))
}

pub async fn heartbeat(
    State(state): State<HttpState>,
    Json(request): Json<ServerIdRequest>,
) -> ApiResult<HeartbeatResponse> {
    let updated_id = state.matchmaker.heartbeat(&request.id).await?;
    Ok(Json(HeartbeatResponse { updated_id }))
}

pub async fn set_status(
    State(state): State<HttpState>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<SetStatusResponse> {
    let server = state
        .matchmaker
        .set_status(&request.id, request.status)
        .await?;
    Ok(Json(SetStatusResponse {
        id: server.id,
        status: server.status,
    }))
}

pub async fn notify_player_joined(
    State(state): State<HttpState>,
    Json(request): Json<PlayerNotificationRequest>,
) -> ApiResult<PlayerNotificationResponse> {
    state
        .matchmaker
        .notify_player_joined(&request.server_id, &request.player_id)
        .await?;
    Ok(Json(PlayerNotificationResponse {
        server_id: request.server_id,
        player_id: request.player_id,
    }))
}

pub async fn notify_player_left(
    State(state): State<HttpState>,
    Json(request): Json<PlayerNotificationRequest>,
) -> ApiResult<PlayerNotificationResponse> {
    state
        .matchmaker
        .notify_player_left(&request.server_id, &request.player_id)
        .await?;
    Ok(Json(PlayerNotificationResponse {
        server_id: request.server_id,
        player_id: request.player_id,
    }))
}

pub async fn enqueue(
    State(state): State<HttpState>,
    Json(request): Json<EnqueueRequest>,
) -> ApiResult<EnqueueResponse> {
    let receipt = state.matchmaker.enqueue(request.into()).await?;
    Ok(Json(EnqueueResponse {
        player_id: receipt.player_id,
        status: receipt.status,
    }))
}

pub async fn dequeue(
    State(state): State<HttpState>,
    Json(request): Json<PlayerIdRequest>,
) -> ApiResult<RemovedResponse> {
    let removed_id = state.matchmaker.dequeue(&request.player_id).await?;
    Ok(Json(RemovedResponse { removed_id }))
}

pub async fn poll_matchmaking(
    State(state): State<HttpState>,
    Json(request): Json<PlayerIdRequest>,
) -> ApiResult<PollResponse> {
    let outcome = state
        .matchmaker
        .poll_matchmaking(&request.player_id)
        .await?;
    Ok(Json(outcome.into()))
}

/// Root endpoint handler - shows service information
pub async fn root(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/client/servers",
            "/client/enqueue",
            "/client/dequeue",
            "/client/pollMatchmaking",
            "/server/register",
            "/server/deregister",
            "/server/sendHeartbeat",
            "/server/setStatus",
            "/server/notifyPlayerJoined",
            "/server/notifyPlayerLeft",
            "/admin/queue",
            "/health",
            "/metrics",
            "/stats"
        ]
    }))
}

/// Health check endpoint handler
pub async fn health(State(state): State<HttpState>) -> impl IntoResponse {
    debug!("Health check requested");

    let running = *state.is_running.read().await;
    let status = match HealthCheck::check(&state.matchmaker, &state.service_name, running).await {
        Ok(health) => health.status,
        Err(e) => {
            error!("Health check failed: {}", e);
            HealthStatus::Unhealthy
        }
    };

    let code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": state.service_name,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Engine statistics endpoint handler
pub async fn stats(State(state): State<HttpState>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    match state.matchmaker.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "service": {
                    "name": state.service_name,
                    "version": env!("CARGO_PKG_VERSION")
                },
                "servers": {
                    "total": stats.servers_total,
                    "open": stats.servers_open
                },
                "players": {
                    "total": stats.players_total(),
                    "queued": stats.players_queued,
                    "matched": stats.players_matched,
                    "joined": stats.players_joined
                },
                "timestamp": chrono::Utc::now()
            })),
        ),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}

/// Prometheus metrics endpoint handler
pub async fn metrics(State(state): State<HttpState>) -> Response {
    debug!("Metrics endpoint requested");

    // Gauges are snapshots; refresh them before encoding
    if let Err(e) = state.matchmaker.stats().await {
        error!("Failed to refresh gauges: {}", e);
    }

    let metric_families = state.metrics_collector.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                StatusCode::OK,
                [("content-type", encoder.format_type().to_string())],
                output,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}
