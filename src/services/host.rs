//! Host implementations of the platform collaborators
//!
//! Calls and alarm playback are delegated to external commands, the same way
//! service management shells out to system tools. Volume is kept in an
//! in-process mixer that the status endpoint reports.

use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tokio::{process::Command, runtime::Handle, sync::oneshot};
use tracing::{debug, error, info, warn};

use super::{
    platform::{
        AlarmPlayback, AlarmPlayerFactory, AudioStream, CallPlacer, CallRequest,
        EmergencyNumberSource, PlaybackError, SoundSettings, TelephonyFeature, VolumeControl,
    },
    preferences::Preferences,
};

const SETTINGS_PREFERENCES_NAME: &str = "emergency_gesture_settings";
const SOUND_ENABLED_KEY: &str = "emergency_gesture_sound_enabled";

/// Alarm stream range, matching common handset alarm volume steps
pub const ALARM_MAX_VOLUME: i32 = 7;

/// Places calls by running `<program> <args...> <number>`
#[derive(Debug, Clone)]
pub struct CommandCallPlacer {
    program: String,
    args: Vec<String>,
}

impl CommandCallPlacer {
    /// Build from a command line split on whitespace
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl CallPlacer for CommandCallPlacer {
    fn place_call(&self, request: &CallRequest) -> Result<(), String> {
        let handle = Handle::try_current()
            .map_err(|e| format!("No runtime available to place call: {}", e))?;

        debug!("Running call command {} for {}", self.program, request.number);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&request.number)
            .env("EMERGENCY_CALL_SOURCE", "emergency_shortcut")
            .env("EMERGENCY_USER_INTENT", request.user_intent_emergency.to_string())
            .spawn()
            .map_err(|e| format!("Failed to execute call command {}: {}", self.program, e))?;

        let program = self.program.clone();
        handle.spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!("Call command {} completed", program),
                Ok(status) => warn!("Call command {} exited with {}", program, status),
                Err(e) => error!("Failed to wait for call command {}: {}", program, e),
            }
        });
        Ok(())
    }
}

/// Call placer used when no call command is configured
#[derive(Debug, Default, Clone)]
pub struct UnavailableCallPlacer;

impl CallPlacer for UnavailableCallPlacer {
    fn place_call(&self, request: &CallRequest) -> Result<(), String> {
        Err(format!("No call command configured, cannot dial {}", request.number))
    }
}

/// Telephony capability fixed at startup
#[derive(Debug, Clone, Copy)]
pub struct StaticTelephony(pub bool);

impl TelephonyFeature for StaticTelephony {
    fn has_telephony(&self) -> bool {
        self.0
    }
}

/// Platform emergency numbers taken from configuration
#[derive(Debug, Clone, Default)]
pub struct ConfiguredNumbers(pub Vec<String>);

impl EmergencyNumberSource for ConfiguredNumbers {
    fn police_numbers(&self) -> Result<Vec<String>, String> {
        Ok(self.0.clone())
    }
}

/// Warning sound setting persisted in the settings preferences namespace
#[derive(Debug)]
pub struct PreferenceSoundSettings {
    preferences: Preferences,
    default_enabled: bool,
}

impl PreferenceSoundSettings {
    pub fn new(data_dir: impl AsRef<Path>, default_enabled: bool) -> Self {
        Self {
            preferences: Preferences::open(data_dir, SETTINGS_PREFERENCES_NAME),
            default_enabled,
        }
    }

    pub fn set_sound_enabled(&self, enabled: bool) -> Result<(), String> {
        self.preferences
            .edit()
            .put_bool(SOUND_ENABLED_KEY, enabled)
            .apply()
            .map_err(|e| format!("Failed to persist sound setting: {}", e))?;
        info!("Warning sound setting changed to {}", enabled);
        Ok(())
    }
}

impl SoundSettings for PreferenceSoundSettings {
    fn is_sound_enabled(&self) -> bool {
        self.preferences.get_bool(SOUND_ENABLED_KEY, self.default_enabled)
    }
}

/// In-process stream volumes
#[derive(Debug)]
pub struct SoftwareMixer {
    levels: Mutex<HashMap<AudioStream, i32>>,
}

impl SoftwareMixer {
    pub fn new(alarm_level: i32) -> Self {
        let mut levels = HashMap::new();
        levels.insert(AudioStream::Alarm, alarm_level.clamp(0, ALARM_MAX_VOLUME));
        Self {
            levels: Mutex::new(levels),
        }
    }
}

impl VolumeControl for SoftwareMixer {
    fn stream_volume(&self, stream: AudioStream) -> i32 {
        self.levels
            .lock()
            .ok()
            .and_then(|levels| levels.get(&stream).copied())
            .unwrap_or(0)
    }

    fn set_stream_volume(&self, stream: AudioStream, level: i32) {
        let level = level.clamp(0, self.stream_max_volume(stream));
        match self.levels.lock() {
            Ok(mut levels) => {
                levels.insert(stream, level);
                debug!("{:?} stream volume set to {}", stream, level);
            }
            Err(e) => error!("Failed to lock mixer: {}", e),
        }
    }

    fn stream_max_volume(&self, stream: AudioStream) -> i32 {
        match stream {
            AudioStream::Alarm => ALARM_MAX_VOLUME,
        }
    }
}

/// Alarm playback running `<program> <args...>` until it exits or is stopped
pub struct CommandPlayback {
    program: String,
    args: Vec<String>,
    released: Arc<AtomicBool>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl AlarmPlayback for CommandPlayback {
    fn start(&mut self) -> Result<(), PlaybackError> {
        if self.stop_tx.is_some() || self.released.load(Ordering::SeqCst) {
            return Err(PlaybackError::InvalidState);
        }
        let handle = Handle::try_current()
            .map_err(|e| PlaybackError::Unavailable(format!("no runtime: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .spawn()?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let released = Arc::clone(&self.released);
        let program = self.program.clone();
        handle.spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => debug!("Alarm {} completed", program),
                    Ok(status) => warn!("Alarm {} exited with {}", program, status),
                    Err(e) => error!("Alarm {} failed: {}", program, e),
                },
                _ = stop_rx => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill alarm {}: {}", program, e);
                    }
                }
            }
            released.store(true, Ordering::SeqCst);
        });

        self.stop_tx = Some(stop_tx);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(PlaybackError::InvalidState);
        }
        let stop_tx = self.stop_tx.take().ok_or(PlaybackError::InvalidState)?;
        stop_tx.send(()).map_err(|_| PlaybackError::InvalidState)
    }

    fn is_active(&self) -> bool {
        self.stop_tx.is_some() && !self.released.load(Ordering::SeqCst)
    }
}

/// Creates [`CommandPlayback`] resources; without a command no alarm can play
#[derive(Debug, Clone, Default)]
pub struct CommandAlarmPlayers {
    command: Option<(String, Vec<String>)>,
}

impl CommandAlarmPlayers {
    pub fn from_command_line(command: Option<&str>) -> Self {
        let command = command.and_then(|line| {
            let mut parts = line.split_whitespace().map(str::to_string);
            parts.next().map(|program| (program, parts.collect()))
        });
        Self { command }
    }
}

impl AlarmPlayerFactory for CommandAlarmPlayers {
    fn create(&self, stream: AudioStream) -> Result<Box<dyn AlarmPlayback>, PlaybackError> {
        let (program, args) = self
            .command
            .clone()
            .ok_or_else(|| PlaybackError::Unavailable("no alarm command configured".to_string()))?;
        debug!("Creating {:?} playback with {}", stream, program);
        Ok(Box::new(CommandPlayback {
            program,
            args,
            released: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
        }))
    }
}
