//! State management module
//!
//! This module contains all state-related structures and their management logic.

pub mod app_state;
pub mod audio_state;
pub mod countdown_state;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, CountdownSettings, Platform};
pub use audio_state::AudioRestoreState;
pub use countdown_state::{CountdownPhase, CountdownState, SavedCountdown, TickOutcome};
pub use timer_state::CountdownStatus;
