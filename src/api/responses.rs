//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{CountdownSnapshot, OutcomeRecord, RetryMode};

/// Body of POST /failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRequest {
    pub error_message: String,
    pub mode: RetryMode,
    #[serde(default)]
    pub countdown_seconds: Option<u32>,
}

/// API response structure for command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub countdown: CountdownSnapshot,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, countdown: CountdownSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            countdown,
        }
    }

    /// A command reached a live countdown
    pub fn accepted(message: String, countdown: CountdownSnapshot) -> Self {
        Self::new("accepted", message, countdown)
    }

    /// A command arrived with nothing left to act on
    pub fn ignored(message: String, countdown: CountdownSnapshot) -> Self {
        Self::new("ignored", message, countdown)
    }

    pub fn error(message: String, countdown: CountdownSnapshot) -> Self {
        Self::new("error", message, countdown)
    }
}

/// Status response with the countdown and the last outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub countdown: CountdownSnapshot,
    pub countdown_text: Option<String>,
    pub last_outcome: Option<OutcomeRecord>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
