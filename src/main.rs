//! Emergency Gesture - countdown, warning sound and emergency call daemon
//!
//! This is the main entry point for the emergency-gesture application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use emergency_gesture::{
    api::create_router,
    config::Config,
    services::check_command_available,
    state::{AppState, Platform},
    tasks::signal_dispatch_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("emergency_gesture={},tower_http=info", config.log_level()))
        .init();

    info!("Starting emergency-gesture server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, countdown={}ms, tick={}ms, data_dir={}",
          config.host, config.port, config.countdown_millis, config.tick_millis,
          config.data_dir.display());

    // External commands are optional; missing ones degrade to logged no-ops
    if let Some(command) = &config.call_command {
        if let Err(e) = check_command_available(command).await {
            warn!("Emergency calls will fail: {}", e);
        }
    }
    if let Some(command) = &config.alarm_command {
        if let Err(e) = check_command_available(command).await {
            warn!("Warning sound will not play: {}", e);
        }
    }
    if !config.has_telephony() {
        warn!("Telephony unavailable, emergency calls will be skipped");
    }

    std::fs::create_dir_all(&config.data_dir)?;

    // Create application state
    let state = Arc::new(AppState::new(&config, Platform::from_config(&config)));

    // Start the background signal dispatch task
    if let Some(dispatch_rx) = state.take_dispatch_receiver() {
        let receiver = Arc::clone(&state.receiver);
        tokio::spawn(async move {
            signal_dispatch_task(receiver, dispatch_rx).await;
        });
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /countdown/start        - Attach screen and start countdown");
    info!("  POST /countdown/slide        - Slide-to-cancel completed");
    info!("  POST /countdown/save         - Save remaining countdown time");
    info!("  POST /countdown/stop         - Screen torn down");
    info!("  GET  /countdown/status       - Countdown progress and view");
    info!("  POST /signals/:action        - Place call or cancel countdown");
    info!("  POST /provider/call          - Emergency number override store");
    info!("  GET  /settings/warning-sound - Warning sound setting");
    info!("  GET  /status                 - Daemon status");
    info!("  GET  /health                 - Health check");

    // Setup graceful shutdown
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

    // Leave the alarm volume as we found it
    state.sound.stop();

    info!("Server shutdown complete");
    Ok(())
}
