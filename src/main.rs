//! Reconnect Coordinator - control server entry point

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use reconnect_coordinator::{
    api::create_router,
    config::Config,
    state::AppState,
    tasks::connection_manager_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "reconnect_coordinator={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting reconnect-coordinator v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, countdown={}s",
        config.host, config.port, config.countdown
    );

    let state = Arc::new(AppState::new(config.port, config.host.clone(), config.countdown));

    // Consume outcomes the way the session owner would
    let manager_state = Arc::clone(&state);
    tokio::spawn(async move {
        connection_manager_task(manager_state).await;
    });

    if let Some(message) = &config.simulate_failure {
        state.report_failure(message.clone(), config.mode, None)?;
    }

    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /failure    - Report a dropped connection and start the countdown");
    info!("  POST /retry-now  - Retry immediately");
    info!("  POST /cancel     - Cancel the pending reconnect");
    info!("  GET  /status     - Countdown and last outcome");
    info!("  GET  /health     - Health check");

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

    info!("Server shutdown complete");
    Ok(())
}
