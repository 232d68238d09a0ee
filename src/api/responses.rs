//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    broadcast::ServiceStatus,
    config::DismissPolicy,
    countdown::{CountdownOptions, CountdownView},
    emergency_number::Bundle,
    state::CountdownStatus,
};

/// API response structure for countdown and signal endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub countdown: CountdownStatus,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, countdown: CountdownStatus) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            countdown,
        }
    }

    pub fn ok(message: String, countdown: CountdownStatus) -> Self {
        Self::new("ok", message, countdown)
    }

    pub fn accepted(message: String, countdown: CountdownStatus) -> Self {
        Self::new("accepted", message, countdown)
    }

    pub fn ignored(message: String, countdown: CountdownStatus) -> Self {
        Self::new("ignored", message, countdown)
    }
}

/// Body of POST /countdown/stop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopRequest {
    /// The screen went away for good rather than being recreated
    #[serde(default)]
    pub dismissed: bool,
}

/// Countdown progress together with what the screen shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownResponse {
    pub status: CountdownStatus,
    pub view: CountdownView,
}

/// Body of POST /provider/call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCallRequest {
    pub method: String,
    #[serde(default)]
    pub arg: Option<String>,
    #[serde(default)]
    pub extras: Bundle,
}

/// Warning sound setting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundSettingBody {
    pub enabled: bool,
}

/// Daemon status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub countdown: CountdownStatus,
    pub view: CountdownView,
    pub options: CountdownOptions,
    pub on_dismiss: DismissPolicy,
    pub background: ServiceStatus,
    pub sound_enabled: bool,
    pub alarm_volume: i32,
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
