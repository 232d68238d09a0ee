//! Warning sound played alongside the emergency countdown

use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use crate::state::AudioRestoreState;
use super::platform::{
    AlarmPlayback, AlarmPlayerFactory, AudioStream, PlaybackError, SoundSettings, VolumeControl,
};

struct Playback {
    player: Option<Box<dyn AlarmPlayback>>,
    restore: AudioRestoreState,
}

/// Alarm-stream warning sound gated by a persisted setting
pub struct WarningSound {
    settings: Arc<dyn SoundSettings>,
    volume: Arc<dyn VolumeControl>,
    players: Arc<dyn AlarmPlayerFactory>,
    playback: Mutex<Playback>,
}

impl WarningSound {
    pub fn new(
        settings: Arc<dyn SoundSettings>,
        volume: Arc<dyn VolumeControl>,
        players: Arc<dyn AlarmPlayerFactory>,
    ) -> Self {
        Self {
            settings,
            volume,
            players,
            playback: Mutex::new(Playback {
                player: None,
                restore: AudioRestoreState::new(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.is_sound_enabled()
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .lock()
            .map(|p| p.player.as_ref().is_some_and(|player| player.is_active()))
            .unwrap_or(false)
    }

    /// Start the alarm at maximum volume. Returns true when playback began.
    pub fn start(&self) -> bool {
        if !self.is_enabled() {
            debug!("Warning sound disabled, not playing");
            return false;
        }

        let mut playback = match self.playback.lock() {
            Ok(playback) => playback,
            Err(e) => {
                error!("Failed to lock warning sound state: {}", e);
                return false;
            }
        };

        if playback.player.as_ref().is_some_and(|player| player.is_active()) {
            debug!("Warning sound already playing");
            return false;
        }

        let mut player = match self.players.create(AudioStream::Alarm) {
            Ok(player) => player,
            Err(e) => {
                warn!("Failed to create alarm player: {}", e);
                return false;
            }
        };
        if let Err(e) = player.start() {
            warn!("Failed to start alarm playback: {}", e);
            return false;
        }

        // A raise left over from a self-released player already holds the original level
        if !playback.restore.restore_needed {
            let current = self.volume.stream_volume(AudioStream::Alarm);
            playback.restore.capture(current);
        }
        let max = self.volume.stream_max_volume(AudioStream::Alarm);
        self.volume.set_stream_volume(AudioStream::Alarm, max);

        playback.player = Some(player);
        info!("Warning sound started at alarm volume {}", max);
        true
    }

    /// Stop the alarm and restore the volume captured by `start`
    pub fn stop(&self) {
        let mut playback = match self.playback.lock() {
            Ok(playback) => playback,
            Err(e) => {
                error!("Failed to lock warning sound state: {}", e);
                return;
            }
        };

        if let Some(mut player) = playback.player.take() {
            match player.stop() {
                Ok(()) => info!("Warning sound stopped"),
                Err(PlaybackError::InvalidState) => {
                    warn!("Alarm player already released, nothing to stop");
                }
                Err(e) => error!("Failed to stop alarm playback: {}", e),
            }
        }

        if let Some(level) = playback.restore.take_restore() {
            self.volume.set_stream_volume(AudioStream::Alarm, level);
            debug!("Alarm volume restored to {}", level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeMixer, FakePlayers, FakeSettings};

    fn sound(enabled: bool, players: Arc<FakePlayers>, mixer: Arc<FakeMixer>) -> WarningSound {
        WarningSound::new(Arc::new(FakeSettings::new(enabled)), mixer, players)
    }

    #[test]
    fn disabled_setting_gates_everything() {
        let players = Arc::new(FakePlayers::default());
        let mixer = Arc::new(FakeMixer::new(3, 7));
        let sound = sound(false, players.clone(), mixer.clone());

        assert!(!sound.start());
        sound.stop();
        assert_eq!(players.created(), 0);
        assert_eq!(mixer.level(), 3);
        assert_eq!(mixer.restores(), 0);
    }

    #[test]
    fn start_forces_max_and_stop_restores_once() {
        let players = Arc::new(FakePlayers::default());
        let mixer = Arc::new(FakeMixer::new(3, 7));
        let sound = sound(true, players.clone(), mixer.clone());

        assert!(sound.start());
        assert!(sound.is_playing());
        assert_eq!(mixer.level(), 7);

        sound.stop();
        assert_eq!(mixer.level(), 3);
        sound.stop();
        assert_eq!(mixer.restores(), 1);
        assert!(!sound.is_playing());
    }

    #[test]
    fn second_start_while_playing_is_a_no_op() {
        let players = Arc::new(FakePlayers::default());
        let mixer = Arc::new(FakeMixer::new(2, 7));
        let sound = sound(true, players.clone(), mixer.clone());

        assert!(sound.start());
        assert!(!sound.start());
        assert_eq!(players.created(), 1);
    }

    #[test]
    fn stop_without_start_does_not_restore() {
        let mixer = Arc::new(FakeMixer::new(4, 7));
        let sound = sound(true, Arc::new(FakePlayers::default()), mixer.clone());

        sound.stop();
        assert_eq!(mixer.restores(), 0);
        assert_eq!(mixer.sets(), 0);
    }

    #[test]
    fn stop_after_self_release_tolerates_invalid_state() {
        let players = Arc::new(FakePlayers::default());
        let mixer = Arc::new(FakeMixer::new(1, 7));
        let sound = sound(true, players.clone(), mixer.clone());

        assert!(sound.start());
        players.complete_all();
        assert!(!sound.is_playing());

        sound.stop();
        assert_eq!(mixer.level(), 1);
        assert_eq!(mixer.restores(), 1);
    }

    #[test]
    fn restart_after_self_release_keeps_original_level() {
        let players = Arc::new(FakePlayers::default());
        let mixer = Arc::new(FakeMixer::new(2, 7));
        let sound = sound(true, players.clone(), mixer.clone());

        assert!(sound.start());
        players.complete_all();
        assert!(sound.start());
        sound.stop();

        assert_eq!(mixer.level(), 2);
        assert_eq!(mixer.restores(), 1);
    }

    #[test]
    fn failed_playback_never_touches_volume() {
        let players = Arc::new(FakePlayers::failing());
        let mixer = Arc::new(FakeMixer::new(5, 7));
        let sound = sound(true, players, mixer.clone());

        assert!(!sound.start());
        sound.stop();
        assert_eq!(mixer.sets(), 0);
        assert_eq!(mixer.level(), 5);
    }

    #[test]
    fn restores_never_exceed_started_playbacks() {
        let players = Arc::new(FakePlayers::default());
        let mixer = Arc::new(FakeMixer::new(3, 7));
        let sound = sound(true, players.clone(), mixer.clone());

        let mut began = 0;
        for step in [true, true, false, false, true, false, true, false, false] {
            if step {
                if sound.start() {
                    began += 1;
                }
            } else {
                sound.stop();
            }
            assert!(mixer.restores() <= began);
        }
        assert_eq!(mixer.level(), 3);
    }
}
