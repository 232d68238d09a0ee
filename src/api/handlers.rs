//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    emergency_number::{Bundle, ProviderError},
    state::{AppState, SavedCountdown},
};
use super::responses::{
    ApiResponse, CountdownResponse, HealthResponse, ProviderCallRequest, SoundSettingBody,
    StatusResponse, StopRequest,
};

/// Handle POST /countdown/start - Attach the screen and start counting down
pub async fn countdown_start_handler(
    State(state): State<Arc<AppState>>,
    saved: Option<Json<SavedCountdown>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let saved = saved.map(|Json(saved)| saved);
    match state.start_countdown(saved).await {
        Ok(countdown) => {
            info!("Countdown started with {}ms remaining", countdown.remaining_millis);
            Ok(Json(ApiResponse::ok("Countdown started".to_string(), countdown)))
        }
        Err(e) => {
            error!("Failed to start countdown: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /countdown/slide - Slide-to-cancel gesture completed
pub async fn countdown_slide_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.slide_complete().await {
        Ok(()) => Ok(Json(ApiResponse::accepted(
            "Slide-to-cancel received".to_string(),
            state.countdown_status(),
        ))),
        Err(e) => {
            warn!("Slide-to-cancel rejected: {}", e);
            Err(StatusCode::CONFLICT)
        }
    }
}

/// Handle POST /countdown/save - Save the remaining countdown time
pub async fn countdown_save_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SavedCountdown>, StatusCode> {
    state.save_countdown().await.map(Json).map_err(|e| {
        warn!("Failed to save countdown: {}", e);
        StatusCode::CONFLICT
    })
}

/// Handle POST /countdown/stop - Screen torn down
pub async fn countdown_stop_handler(
    State(state): State<Arc<AppState>>,
    request: Option<Json<StopRequest>>,
) -> Result<Json<SavedCountdown>, StatusCode> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    state.stop_countdown(request.dismissed).await.map(Json).map_err(|e| {
        warn!("Failed to stop countdown: {}", e);
        StatusCode::CONFLICT
    })
}

/// Handle GET /countdown/status - Countdown progress and view
pub async fn countdown_status_handler(State(state): State<Arc<AppState>>) -> Json<CountdownResponse> {
    Json(CountdownResponse {
        status: state.countdown_status(),
        view: state.countdown_view(),
    })
}

/// Handle POST /signals/:action - Background continuation signal
pub async fn signal_handler(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.send_signal(&action) {
        Some(action) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::accepted(
                format!("Signal {} dispatched", action.action_name()),
                state.countdown_status(),
            )),
        ),
        None => (
            StatusCode::OK,
            Json(ApiResponse::ignored(
                format!("Unknown signal {} ignored", action),
                state.countdown_status(),
            )),
        ),
    }
}

fn provider_status(e: ProviderError) -> StatusCode {
    match e {
        ProviderError::Unsupported(op) => {
            warn!("Rejected unsupported provider operation: {}", op);
            StatusCode::NOT_IMPLEMENTED
        }
        ProviderError::Storage(e) => {
            error!("Emergency number storage failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Handle POST /provider/call - Override store method call
pub async fn provider_call_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProviderCallRequest>,
) -> Result<Json<Bundle>, StatusCode> {
    state
        .provider
        .call(&request.method, request.arg.as_deref(), &request.extras)
        .map(Json)
        .map_err(provider_status)
}

/// Handle /provider/query
pub async fn provider_query_handler(State(state): State<Arc<AppState>>) -> Result<Json<Bundle>, StatusCode> {
    state.provider.query().map(Json).map_err(provider_status)
}

/// Handle /provider/type
pub async fn provider_type_handler(State(state): State<Arc<AppState>>) -> Result<String, StatusCode> {
    state.provider.get_type().map_err(provider_status)
}

/// Handle /provider/insert
pub async fn provider_insert_handler(State(state): State<Arc<AppState>>) -> Result<StatusCode, StatusCode> {
    state
        .provider
        .insert(&Bundle::new())
        .map(|()| StatusCode::CREATED)
        .map_err(provider_status)
}

/// Handle /provider/update
pub async fn provider_update_handler(State(state): State<Arc<AppState>>) -> Result<Json<usize>, StatusCode> {
    state.provider.update(&Bundle::new()).map(Json).map_err(provider_status)
}

/// Handle /provider/delete
pub async fn provider_delete_handler(State(state): State<Arc<AppState>>) -> Result<Json<usize>, StatusCode> {
    state.provider.delete().map(Json).map_err(provider_status)
}

/// Handle GET /settings/warning-sound
pub async fn sound_setting_handler(State(state): State<Arc<AppState>>) -> Json<SoundSettingBody> {
    Json(SoundSettingBody {
        enabled: state.is_sound_enabled(),
    })
}

/// Handle PUT /settings/warning-sound
pub async fn sound_setting_update_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SoundSettingBody>,
) -> Result<Json<SoundSettingBody>, StatusCode> {
    match state.set_sound_enabled(body.enabled) {
        Ok(()) => Ok(Json(body)),
        Err(e) => {
            error!("Failed to update sound setting: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return current daemon status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        countdown: state.countdown_status(),
        view: state.countdown_view(),
        options: state.countdown.options,
        on_dismiss: state.countdown.on_dismiss,
        background: state.service_status(),
        sound_enabled: state.is_sound_enabled(),
        alarm_volume: state.alarm_volume(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
