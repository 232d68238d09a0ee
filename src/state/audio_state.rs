//! Alarm volume restore bookkeeping

/// Volume level captured before the warning sound forced the alarm stream to maximum
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioRestoreState {
    pub saved_volume_level: i32,
    pub restore_needed: bool,
}

impl AudioRestoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the level in effect before raising the volume
    pub fn capture(&mut self, level: i32) {
        self.saved_volume_level = level;
        self.restore_needed = true;
    }

    /// Hand out the saved level exactly once per capture
    pub fn take_restore(&mut self) -> Option<i32> {
        if self.restore_needed {
            self.restore_needed = false;
            Some(self.saved_volume_level)
        } else {
            None
        }
    }
}
