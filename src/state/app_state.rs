//! Main application state management

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tracing::{info, warn};

use crate::{
    broadcast::{
        new_call_emergency_trigger, new_cancel_countdown_trigger, AlarmScheduler, BackgroundUnit,
        EmergencyAction, EmergencyActionReceiver, EmergencyActionService, ServiceStatus,
        TokioAlarmScheduler,
    },
    config::{Config, DismissPolicy},
    countdown::{CountdownController, CountdownOptions, CountdownView, WatchDisplay},
    emergency_number::EmergencyNumberProvider,
    services::{
        host::{
            CommandAlarmPlayers, CommandCallPlacer, ConfiguredNumbers, PreferenceSoundSettings,
            SoftwareMixer, StaticTelephony, UnavailableCallPlacer,
        },
        AlarmPlayerFactory, AudioStream, CallPlacer, EmergencyCaller, EmergencyNumberResolver,
        EmergencyNumberSource, SoundSettings, TelephonyFeature, VolumeControl, WarningSound,
    },
    tasks::CountdownSession,
};
use super::{CountdownPhase, CountdownState, CountdownStatus, SavedCountdown};

/// Platform collaborators the daemon runs against
#[derive(Clone)]
pub struct Platform {
    pub placer: Arc<dyn CallPlacer>,
    pub telephony: Arc<dyn TelephonyFeature>,
    pub numbers: Arc<dyn EmergencyNumberSource>,
    pub volume: Arc<dyn VolumeControl>,
    pub players: Arc<dyn AlarmPlayerFactory>,
}

impl Platform {
    /// Host collaborators described by the command line
    pub fn from_config(config: &Config) -> Self {
        let placer: Arc<dyn CallPlacer> = match config
            .call_command
            .as_deref()
            .and_then(CommandCallPlacer::from_command_line)
        {
            Some(placer) => Arc::new(placer),
            None => Arc::new(UnavailableCallPlacer),
        };

        Self {
            placer,
            telephony: Arc::new(StaticTelephony(config.has_telephony())),
            numbers: Arc::new(ConfiguredNumbers(config.emergency_numbers.clone())),
            volume: Arc::new(SoftwareMixer::new(config.alarm_volume)),
            players: Arc::new(CommandAlarmPlayers::from_command_line(config.alarm_command.as_deref())),
        }
    }
}

/// Countdown settings fixed at startup
#[derive(Debug, Clone, Copy)]
pub struct CountdownSettings {
    pub options: CountdownOptions,
    pub total: Duration,
    pub tick_interval: Duration,
    pub on_dismiss: DismissPolicy,
}

impl CountdownSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            options: config.countdown_options(),
            total: config.countdown_duration(),
            tick_interval: config.tick_interval(),
            on_dismiss: config.on_dismiss,
        }
    }
}

/// Main application state wiring the countdown, background path and override store
pub struct AppState {
    pub countdown: CountdownSettings,
    pub provider: Arc<EmergencyNumberProvider>,
    pub resolver: Arc<EmergencyNumberResolver>,
    pub caller: Arc<EmergencyCaller>,
    pub sound_settings: Arc<PreferenceSoundSettings>,
    pub sound: Arc<WarningSound>,
    pub volume: Arc<dyn VolumeControl>,
    pub scheduler: Arc<TokioAlarmScheduler>,
    pub service: Arc<EmergencyActionService>,
    pub receiver: Arc<EmergencyActionReceiver>,
    display: WatchDisplay,
    session: AsyncMutex<Option<CountdownSession>>,
    /// Countdown progress and display view for status readers
    pub status_tx: watch::Sender<CountdownStatus>,
    pub view_tx: watch::Sender<CountdownView>,
    dispatch_rx: Mutex<Option<mpsc::UnboundedReceiver<EmergencyAction>>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create the state from parsed configuration and host collaborators
    pub fn new(config: &Config, platform: Platform) -> Self {
        Self::build(
            CountdownSettings::from_config(config),
            &config.data_dir,
            config.warning_sound,
            platform,
            config.port,
            config.host.clone(),
        )
    }

    pub fn build(
        countdown: CountdownSettings,
        data_dir: &Path,
        sound_default: bool,
        platform: Platform,
        port: u16,
        host: String,
    ) -> Self {
        let provider = Arc::new(EmergencyNumberProvider::new(data_dir));
        let resolver = Arc::new(EmergencyNumberResolver::new(Arc::clone(&provider), platform.numbers));
        let caller = Arc::new(EmergencyCaller::new(
            platform.telephony,
            platform.placer,
            Arc::clone(&resolver),
        ));

        let sound_settings = Arc::new(PreferenceSoundSettings::new(data_dir, sound_default));
        let settings: Arc<dyn SoundSettings> = sound_settings.clone();
        let sound = Arc::new(WarningSound::new(settings, Arc::clone(&platform.volume), platform.players));

        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(TokioAlarmScheduler::new(dispatch_tx));
        let service = Arc::new(EmergencyActionService::new(scheduler.clone(), Arc::clone(&sound)));
        let receiver = Arc::new(EmergencyActionReceiver::new(
            Arc::clone(&caller),
            scheduler.clone(),
            service.clone(),
        ));

        let (status_tx, _) = watch::channel(CountdownStatus::idle());
        let (view_tx, _) = watch::channel(CountdownView::default());

        Self {
            countdown,
            provider,
            resolver,
            caller,
            sound_settings,
            sound,
            volume: platform.volume,
            scheduler,
            service,
            receiver,
            display: WatchDisplay::new(view_tx.clone()),
            session: AsyncMutex::new(None),
            status_tx,
            view_tx,
            dispatch_rx: Mutex::new(Some(dispatch_rx)),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Hand the fired-trigger channel to the dispatch task (once)
    pub fn take_dispatch_receiver(&self) -> Option<mpsc::UnboundedReceiver<EmergencyAction>> {
        self.dispatch_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Screen attach: start a countdown, restarting any running one
    pub async fn start_countdown(&self, saved: Option<SavedCountdown>) -> Result<CountdownStatus, String> {
        let mut session = self.session.lock().await;

        if let Some(previous) = session.take() {
            if !previous.is_finished() {
                info!("Stopping previous countdown before restart");
            }
            previous.stop().await?;
        }
        if self.service.is_running() {
            info!("Screen countdown supersedes background countdown");
            self.scheduler.cancel(&new_call_emergency_trigger());
            self.service.stop();
        }

        let remaining = saved.map(|s| s.remaining()).unwrap_or(self.countdown.total);
        let display = Arc::new(self.display.clone());
        let controller = CountdownController::new(
            self.countdown.options,
            self.countdown.tick_interval,
            CountdownState::new(remaining),
            display.clone(),
            Arc::clone(&self.caller),
            Arc::clone(&self.sound),
        )
        .with_display(display);

        self.display.open();
        *session = Some(CountdownSession::spawn(
            controller,
            SavedCountdown::from(remaining),
            self.status_tx.clone(),
        ));
        drop(session);

        self.record_action("countdown-start");
        Ok(CountdownStatus::new(CountdownPhase::Running, remaining))
    }

    /// Slide-to-cancel completed on the screen
    pub async fn slide_complete(&self) -> Result<(), String> {
        if !self.countdown.options.enable_cancel_gesture {
            return Err("Slide-to-cancel is not enabled".to_string());
        }
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or_else(|| "No countdown running".to_string())?;
        session.slide_complete()?;
        self.record_action("countdown-slide");
        Ok(())
    }

    /// Save-state boundary: remaining time of the running countdown
    pub async fn save_countdown(&self) -> Result<SavedCountdown, String> {
        let session = self.session.lock().await;
        let session = session.as_ref().ok_or_else(|| "No countdown running".to_string())?;
        session.save().await
    }

    /// Screen teardown. A dismissal mid-countdown follows the configured policy.
    pub async fn stop_countdown(&self, dismissed: bool) -> Result<SavedCountdown, String> {
        let session = self.session.lock().await.take();
        let session = session.ok_or_else(|| "No countdown running".to_string())?;
        let (saved, phase) = session.stop().await?;

        if dismissed {
            if phase == CountdownPhase::Idle && saved.remaining_millis > 0 {
                match self.countdown.on_dismiss {
                    DismissPolicy::Continue if self.countdown.options.enable_call => {
                        self.service.start(saved.remaining())?
                    }
                    DismissPolicy::Continue => {
                        info!("Countdown dismissed with {}ms left, calling is disabled so abandoning",
                              saved.remaining_millis);
                    }
                    DismissPolicy::Abandon => {
                        info!("Countdown dismissed with {}ms left, abandoning", saved.remaining_millis);
                    }
                }
            }
            self.display.close_if_open();
        }

        self.record_action(if dismissed { "countdown-dismiss" } else { "countdown-stop" });
        Ok(saved)
    }

    /// Route a background signal through the dispatch task
    pub fn send_signal(&self, action_name: &str) -> Option<EmergencyAction> {
        let action = match EmergencyAction::from_action_name(action_name) {
            Some(action) => action,
            None => {
                warn!("Unknown action received, skipping: {}", action_name);
                return None;
            }
        };
        let trigger = match action {
            EmergencyAction::PlaceCall => new_call_emergency_trigger(),
            EmergencyAction::CancelCountdown => new_cancel_countdown_trigger(),
        };
        self.scheduler.send(&trigger);
        self.record_action(action.action_name());
        Some(action)
    }

    pub fn countdown_status(&self) -> CountdownStatus {
        self.status_tx.borrow().clone()
    }

    pub fn countdown_view(&self) -> CountdownView {
        self.view_tx.borrow().clone()
    }

    pub fn service_status(&self) -> ServiceStatus {
        self.service.status()
    }

    pub fn alarm_volume(&self) -> i32 {
        self.volume.stream_volume(AudioStream::Alarm)
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.sound_settings.is_sound_enabled()
    }

    pub fn set_sound_enabled(&self, enabled: bool) -> Result<(), String> {
        self.sound_settings.set_sound_enabled(enabled)?;
        self.record_action(if enabled { "sound-on" } else { "sound-off" });
        Ok(())
    }

    /// Update last action tracking
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
