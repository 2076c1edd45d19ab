//! Notification logging background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::{AppState, Notification};

/// Background task that writes every notification to the log
pub async fn notification_log_task(state: Arc<AppState>) {
    info!("Starting notification log task");

    let mut notification_rx = state.subscribe();

    loop {
        match notification_rx.recv().await {
            Ok(notification) => match &notification {
                Notification::Halfway { timer_id, .. } | Notification::Completed { timer_id, .. } => {
                    info!("[{}] {}", timer_id, notification.title());
                }
                Notification::ValidationFailed { .. } | Notification::PersistenceWarning { .. } => {
                    warn!("{}", notification.title());
                }
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!("Notification log fell behind, skipped {} notifications", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Notification channel closed, stopping log task");
                break;
            }
        }
    }
}
