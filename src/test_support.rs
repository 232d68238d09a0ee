//! Recording fakes for the platform collaborators

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use crate::{
    broadcast::{AlarmScheduler, BackgroundUnit, EmergencyAction, TriggerHandle},
    emergency_number::EmergencyNumberProvider,
    services::{
        AlarmPlayback, AlarmPlayerFactory, AudioStream, CallPlacer, CallRequest, CountdownDisplay,
        EmergencyCaller, EmergencyNumberResolver, EmergencyNumberSource, PlaybackError, Screen,
        SoundSettings, TelephonyFeature, VolumeControl, WarningSound,
    },
};

pub struct FixedNumbers(pub Result<Vec<String>, String>);

impl EmergencyNumberSource for FixedNumbers {
    fn police_numbers(&self) -> Result<Vec<String>, String> {
        self.0.clone()
    }
}

pub struct Telephony(pub bool);

impl TelephonyFeature for Telephony {
    fn has_telephony(&self) -> bool {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingPlacer {
    pub calls: Mutex<Vec<CallRequest>>,
    pub fail: bool,
}

impl RecordingPlacer {
    pub fn numbers(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.number.clone()).collect()
    }
}

impl CallPlacer for RecordingPlacer {
    fn place_call(&self, request: &CallRequest) -> Result<(), String> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            Err("line busy".to_string())
        } else {
            Ok(())
        }
    }
}

pub struct FakeSettings(AtomicBool);

impl FakeSettings {
    pub fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }
}

impl SoundSettings for FakeSettings {
    fn is_sound_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Alarm mixer recording every level change
pub struct FakeMixer {
    max: i32,
    level: Mutex<i32>,
    sets: Mutex<Vec<i32>>,
}

impl FakeMixer {
    pub fn new(level: i32, max: i32) -> Self {
        Self {
            max,
            level: Mutex::new(level),
            sets: Mutex::new(Vec::new()),
        }
    }

    pub fn level(&self) -> i32 {
        *self.level.lock().unwrap()
    }

    pub fn sets(&self) -> usize {
        self.sets.lock().unwrap().len()
    }

    /// Level changes that did not raise to maximum
    pub fn restores(&self) -> usize {
        self.sets.lock().unwrap().iter().filter(|&&l| l != self.max).count()
    }
}

impl VolumeControl for FakeMixer {
    fn stream_volume(&self, _stream: AudioStream) -> i32 {
        self.level()
    }

    fn set_stream_volume(&self, _stream: AudioStream, level: i32) {
        *self.level.lock().unwrap() = level;
        self.sets.lock().unwrap().push(level);
    }

    fn stream_max_volume(&self, _stream: AudioStream) -> i32 {
        self.max
    }
}

struct FakePlayback {
    active: Arc<AtomicBool>,
}

impl AlarmPlayback for FakePlayback {
    fn start(&mut self) -> Result<(), PlaybackError> {
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        if self.active.swap(false, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PlaybackError::InvalidState)
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Player factory whose players can be completed from the test
#[derive(Default)]
pub struct FakePlayers {
    fail: bool,
    players: Mutex<Vec<Arc<AtomicBool>>>,
}

impl FakePlayers {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> usize {
        self.players.lock().unwrap().len()
    }

    /// Simulate natural completion of every player
    pub fn complete_all(&self) {
        for active in self.players.lock().unwrap().iter() {
            active.store(false, Ordering::SeqCst);
        }
    }
}

impl AlarmPlayerFactory for FakePlayers {
    fn create(&self, _stream: AudioStream) -> Result<Box<dyn AlarmPlayback>, PlaybackError> {
        if self.fail {
            return Err(PlaybackError::Unavailable("no speaker".to_string()));
        }
        let active = Arc::new(AtomicBool::new(false));
        self.players.lock().unwrap().push(Arc::clone(&active));
        Ok(Box::new(FakePlayback { active }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Start(Duration),
    Remaining(Duration),
    Show,
    Stop,
}

#[derive(Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn remaining_updates(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Remaining(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl CountdownDisplay for RecordingDisplay {
    fn start(&self, total: Duration) {
        self.events.lock().unwrap().push(DisplayEvent::Start(total));
    }

    fn set_remaining(&self, remaining: Duration) {
        self.events.lock().unwrap().push(DisplayEvent::Remaining(remaining));
    }

    fn show(&self) {
        self.events.lock().unwrap().push(DisplayEvent::Show);
    }

    fn stop(&self) {
        self.events.lock().unwrap().push(DisplayEvent::Stop);
    }
}

#[derive(Default)]
pub struct RecordingScreen {
    closes: AtomicUsize,
}

impl RecordingScreen {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Screen for RecordingScreen {
    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<(EmergencyAction, Duration)>>,
    cancelled: Mutex<Vec<EmergencyAction>>,
}

impl RecordingScheduler {
    pub fn scheduled(&self) -> Vec<(EmergencyAction, Duration)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<EmergencyAction> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl AlarmScheduler for RecordingScheduler {
    fn schedule(&self, trigger: &TriggerHandle, delay: Duration) {
        self.scheduled.lock().unwrap().push((trigger.action(), delay));
    }

    fn cancel(&self, trigger: &TriggerHandle) {
        self.cancelled.lock().unwrap().push(trigger.action());
    }

    fn send(&self, _trigger: &TriggerHandle) {}
}

#[derive(Default)]
pub struct RecordingUnit {
    stops: AtomicUsize,
}

impl RecordingUnit {
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl BackgroundUnit for RecordingUnit {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        false
    }
}

/// Caller dialing through `placer`, with `platform` as the platform number list
pub fn caller(
    dir: &Path,
    telephony: bool,
    placer: Arc<RecordingPlacer>,
    platform: &[&str],
) -> Arc<EmergencyCaller> {
    let numbers = Arc::new(EmergencyNumberResolver::new(
        Arc::new(EmergencyNumberProvider::new(dir)),
        Arc::new(FixedNumbers(Ok(platform.iter().map(|n| n.to_string()).collect()))),
    ));
    Arc::new(EmergencyCaller::new(Arc::new(Telephony(telephony)), placer, numbers))
}

pub fn warning_sound(enabled: bool, players: Arc<FakePlayers>, mixer: Arc<FakeMixer>) -> Arc<WarningSound> {
    Arc::new(WarningSound::new(Arc::new(FakeSettings::new(enabled)), mixer, players))
}
