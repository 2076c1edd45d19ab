//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TrackerError,
    state::{Timer, TimerCounts},
};

/// Duration as typed by a user: a JSON number or a string of digits.
/// Anything else is kept as raw JSON so validation can reject it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationField {
    Seconds(i64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for DurationField {
    fn default() -> Self {
        DurationField::Text(String::new())
    }
}

impl DurationField {
    pub fn into_text(self) -> String {
        match self {
            DurationField::Seconds(seconds) => seconds.to_string(),
            DurationField::Text(text) => text,
            DurationField::Other(serde_json::Value::Null) => String::new(),
            DurationField::Other(value) => value.to_string(),
        }
    }
}

/// Body of POST /timers. Missing or null fields deserialize empty and fail
/// validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddTimerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration: DurationField,
    #[serde(default)]
    pub category: Option<String>,
}

/// Response for commands that change a timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: Timer,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: Timer) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Create a success response
    pub fn ok(message: String, timer: Timer) -> Self {
        Self::new("ok".to_string(), message, timer)
    }
}

/// Error body returned with a non-2xx status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Tracker error carried to the HTTP boundary
#[derive(Debug)]
pub struct ApiError(pub TrackerError);

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::AlreadyCompleted(_) => StatusCode::CONFLICT,
            TrackerError::Persistence(_) | TrackerError::StateLock(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.0.to_string(),
            timestamp: Utc::now(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Status response with timer counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timers: TimerCounts,
    pub active_tickers: usize,
    pub history_entries: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
