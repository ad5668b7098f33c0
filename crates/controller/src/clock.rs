use crate::window::SECONDS_PER_DAY;

/// Elapsed seconds within the 24-hour cycle. The driver loop advances it
/// once per second while the gate is in manual time mode; in time-sync
/// mode the counter sits idle because an external time authority is
/// assumed valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayClock {
    seconds: u32,
}

impl DayClock {
    pub fn new() -> Self {
        Self { seconds: 0 }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Advance one second, wrapping silently to 0 at the end of the day.
    pub fn tick(&mut self) {
        self.seconds += 1;
        if self.seconds >= SECONDS_PER_DAY {
            self.seconds = 0;
        }
    }

    #[cfg(test)]
    pub fn set_seconds(&mut self, seconds: u32) {
        self.seconds = seconds % SECONDS_PER_DAY;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
