//! Platform services module
//!
//! Collaborator interfaces, their host implementations, preferences storage,
//! call placement and the warning sound.

pub mod host;
pub mod platform;
pub mod preferences;
pub mod system;
pub mod telecom;
pub mod warning_sound;

// Re-export main types
pub use platform::*;
pub use system::check_command_available;
pub use telecom::{CallOutcome, EmergencyCaller, EmergencyNumberResolver, FALLBACK_EMERGENCY_NUMBER};
pub use warning_sound::WarningSound;
