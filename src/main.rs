//! Timer Tracker - A state-managed countdown timer tracker
//!
//! This is the main entry point for the timer-tracker application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use timer_tracker::{
    api::create_router,
    config::Config,
    state::{AppState, TimerStore},
    storage::{FileStorage, MemoryStorage},
    tasks::notification_log_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_tracker={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-tracker v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, tick={}ms",
        config.host, config.port, config.tick_ms
    );

    // Load timers and history once, before any command is accepted
    let store = if config.ephemeral {
        info!("Ephemeral mode, state will not be persisted");
        TimerStore::load(MemoryStorage::new())?
    } else {
        let data_dir = config.data_dir();
        info!("Data directory: {}", data_dir.display());
        TimerStore::load(FileStorage::open(data_dir)?)?
    };

    let state = Arc::new(AppState::new(
        store,
        config.port,
        config.host.clone(),
        config.tick_interval(),
    ));

    // Log notifications as they happen
    let log_state = Arc::clone(&state);
    tokio::spawn(async move {
        notification_log_task(log_state).await;
    });

    // Timers persisted while running pick up where they left off
    state.resume_running()?;

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timers            - Add a timer");
    info!("  GET  /timers            - Timers grouped by category");
    info!("  GET  /timers/:id        - A single timer");
    info!("  POST /timers/:id/start  - Start a timer");
    info!("  POST /timers/:id/pause  - Pause a timer");
    info!("  POST /timers/:id/reset  - Reset a timer");
    info!("  GET  /history           - Completed timers");
    info!("  GET  /events            - Notification stream (SSE)");
    info!("  GET  /status            - Tracker status");
    info!("  GET  /health            - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
