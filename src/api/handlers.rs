//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::{AppState, CategoryGroup, Command, HistoryEntry, Timer};
use super::responses::{AddTimerRequest, ApiError, ApiResponse, HealthResponse, StatusResponse};

/// Handle POST /timers - Create a paused timer
pub async fn add_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddTimerRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let timer = state.dispatch(Command::AddTimer {
        name: request.name.unwrap_or_default(),
        duration: request.duration.into_text(),
        category: request.category.unwrap_or_default(),
    })?;

    info!("Timer '{}' created in category '{}'", timer.name, timer.category);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(format!("Timer '{}' created", timer.name), timer)),
    ))
}

/// Handle GET /timers - Timers grouped by category
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryGroup>>, ApiError> {
    Ok(Json(state.get_timers_grouped_by_category()?))
}

/// Handle GET /timers/:id - A single timer
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Timer>, ApiError> {
    Ok(Json(state.get_timer(&id)?))
}

/// Handle POST /timers/:id/start - Start counting down
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let timer = state.dispatch(Command::StartTimer(id))?;
    Ok(Json(ApiResponse::ok(status_message(&timer), timer)))
}

/// Handle POST /timers/:id/pause - Pause a running timer
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let timer = state.dispatch(Command::PauseTimer(id))?;
    Ok(Json(ApiResponse::ok(status_message(&timer), timer)))
}

/// Handle POST /timers/:id/reset - Restore the full countdown
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let timer = state.dispatch(Command::ResetTimer(id))?;
    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' reset to {}s", timer.name, timer.duration),
        timer,
    )))
}

/// Handle GET /history - Completed timers in completion order
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    Ok(Json(state.get_history()?))
}

/// Handle GET /events - Stream notifications as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let notifications = state.subscribe();

    let events = stream::unfold(notifications, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    let event = Event::default()
                        .event("notification")
                        .json_data(&notification)
                        .unwrap_or_else(|e| Event::default().comment(e.to_string()));
                    return Some((Ok(event), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, skipped {} notifications", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return current tracker status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let timers = state.get_counts()?;
    let history_entries = state.get_history()?.len();
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timers,
        active_tickers: state.clock().active_tickers(),
        history_entries,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn status_message(timer: &Timer) -> String {
    format!(
        "Timer '{}' is {:?} with {}s remaining",
        timer.name, timer.status, timer.remaining
    )
}
