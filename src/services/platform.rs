//! Collaborator interfaces for platform capabilities
//!
//! The countdown, warning sound, background path and number store only talk
//! to the outside world through these narrow traits. Host implementations
//! live in [`super::host`]; tests substitute recording fakes.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Countdown widget driven by the controller
pub trait CountdownDisplay: Send + Sync {
    /// Begin animating a countdown of `total` length
    fn start(&self, total: Duration);
    /// Show the remaining time
    fn set_remaining(&self, remaining: Duration);
    /// Make the countdown visible
    fn show(&self);
    /// Stop animating
    fn stop(&self);
}

/// The screen hosting the countdown
pub trait Screen: Send + Sync {
    fn close(&self);
}

/// Origin of an outgoing call, attached to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSource {
    EmergencyShortcut,
}

/// Outgoing emergency call request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub number: String,
    pub user_intent_emergency: bool,
    pub source: CallSource,
}

impl CallRequest {
    pub fn emergency_shortcut(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            user_intent_emergency: true,
            source: CallSource::EmergencyShortcut,
        }
    }
}

/// Places telephone calls
pub trait CallPlacer: Send + Sync {
    fn place_call(&self, request: &CallRequest) -> Result<(), String>;
}

/// Reports whether the device can place calls at all
pub trait TelephonyFeature: Send + Sync {
    fn has_telephony(&self) -> bool;
}

/// Provides the platform list of police emergency numbers
pub trait EmergencyNumberSource: Send + Sync {
    fn police_numbers(&self) -> Result<Vec<String>, String>;
}

/// Reads the persisted warning sound setting
pub trait SoundSettings: Send + Sync {
    fn is_sound_enabled(&self) -> bool;
}

/// Audio streams the daemon adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStream {
    Alarm,
}

/// Stream volume control
pub trait VolumeControl: Send + Sync {
    fn stream_volume(&self, stream: AudioStream) -> i32;
    fn set_stream_volume(&self, stream: AudioStream, level: i32);
    fn stream_max_volume(&self, stream: AudioStream) -> i32;
}

/// Playback failures
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The resource was already released or never started
    #[error("playback is not in a valid state")]
    InvalidState,
    #[error("no alarm player available: {0}")]
    Unavailable(String),
    #[error("playback I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One alarm playback resource. Releases itself on natural completion or error.
pub trait AlarmPlayback: Send {
    fn start(&mut self) -> Result<(), PlaybackError>;
    fn stop(&mut self) -> Result<(), PlaybackError>;
    fn is_active(&self) -> bool;
}

/// Creates alarm-category playback resources
pub trait AlarmPlayerFactory: Send + Sync {
    fn create(&self, stream: AudioStream) -> Result<Box<dyn AlarmPlayback>, PlaybackError>;
}
