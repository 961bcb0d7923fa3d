//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{error::CoordinatorError, state::AppState};
use super::responses::{ApiResponse, FailureRequest, HealthResponse, StatusResponse};

/// Handle POST /failure - Start a reconnect countdown for a dropped connection
pub async fn failure_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FailureRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), StatusCode> {
    match state.report_failure(request.error_message, request.mode, request.countdown_seconds) {
        Ok(countdown) => {
            info!("Failure endpoint called - reconnect countdown started");
            Ok((
                StatusCode::OK,
                Json(ApiResponse::accepted(
                    "Reconnect countdown started".to_string(),
                    countdown,
                )),
            ))
        }
        Err(e @ CoordinatorError::InvalidCountdown { .. }) => {
            warn!("Rejected failure report: {}", e);
            Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(e.to_string(), state.get_countdown())),
            ))
        }
        Err(e) => {
            error!("Failed to start reconnect countdown: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /retry-now - The user asked to retry immediately
pub async fn retry_now_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    match state.request_retry_now().await {
        Ok(true) => {
            info!("Retry-now endpoint called - countdown resolved with a retry");
            Ok(Json(ApiResponse::accepted(
                "Retrying now".to_string(),
                state.get_countdown(),
            )))
        }
        Ok(false) => Ok(Json(ApiResponse::ignored(
            "No reconnect countdown in progress, or it already resolved".to_string(),
            state.get_countdown(),
        ))),
        Err(e) => {
            error!("Failed to request immediate retry: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /cancel - The user gave up on reconnecting
pub async fn cancel_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    match state.request_cancel().await {
        Ok(true) => {
            info!("Cancel endpoint called - countdown resolved with a cancel");
            Ok(Json(ApiResponse::accepted(
                "Reconnect cancelled".to_string(),
                state.get_countdown(),
            )))
        }
        Ok(false) => Ok(Json(ApiResponse::ignored(
            "No reconnect countdown in progress, or it already resolved".to_string(),
            state.get_countdown(),
        ))),
        Err(e) => {
            error!("Failed to request cancellation: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return the countdown and last outcome
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let last_outcome = match state.get_last_outcome() {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to get last outcome: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let countdown = state.get_countdown();
    Ok(Json(StatusResponse {
        countdown_text: countdown.countdown_text(),
        countdown,
        last_outcome,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
