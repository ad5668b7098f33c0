//! The system gate: the top-level boolean permitting any relay output.
//!
//! Two states. In time-sync mode the gate is pinned active, deferring to
//! an external time authority. In manual mode the gate follows the global
//! time window, recomputed on every clock tick and immediately on entry.

use crate::window::TimeWindow;

#[derive(Debug, Clone)]
pub struct SystemGate {
    time_sync: bool,
    active: bool,
    window: TimeWindow,
}

impl SystemGate {
    /// Initial state: time-sync mode, gate open.
    pub fn new(window: TimeWindow) -> Self {
        Self {
            time_sync: true,
            active: true,
            window,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn time_sync(&self) -> bool {
        self.time_sync
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// `/ntp`: trust the external time source, gate pinned open.
    pub fn enter_time_sync(&mut self) {
        self.time_sync = true;
        self.active = true;
    }

    /// `/manual`: follow the global window, recomputed right away.
    pub fn enter_manual(&mut self, clock_seconds: u32) {
        self.time_sync = false;
        self.recompute(clock_seconds);
    }

    /// Merge new window endpoints. Takes effect on the next tick, not
    /// immediately.
    pub fn set_window(&mut self, start: Option<(u8, u8)>, end: Option<(u8, u8)>) {
        self.window.merge(start, end);
    }

    /// Per-tick recompute. A no-op while time-synced.
    pub fn on_tick(&mut self, clock_seconds: u32) {
        if !self.time_sync {
            self.recompute(clock_seconds);
        }
    }

    fn recompute(&mut self, clock_seconds: u32) {
        self.active = self.window.is_within(clock_seconds);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SystemGate {
        SystemGate::new(TimeWindow::new(8, 0, 16, 0))
    }

    // -- Time-sync precedence ------------------------------------------------

    #[test]
    fn time_sync_pins_active_regardless_of_window() {
        let mut g = gate();
        g.on_tick(3 * 3600); // 03:00, well outside 08:00-16:00
        assert!(g.active());
        g.on_tick(12 * 3600);
        assert!(g.active());
    }

    // -- Manual mode -----------------------------------------------------------

    #[test]
    fn enter_manual_inside_window_is_active() {
        let mut g = gate();
        g.enter_manual(12 * 3600);
        assert!(g.active());
        assert!(!g.time_sync());
    }

    #[test]
    fn enter_manual_outside_window_is_inactive() {
        let mut g = gate();
        g.enter_manual(3 * 3600);
        assert!(!g.active());
    }

    #[test]
    fn manual_tick_tracks_the_window() {
        let mut g = gate();
        g.enter_manual(8 * 3600 - 1);
        assert!(!g.active());
        g.on_tick(8 * 3600);
        assert!(g.active());
        g.on_tick(16 * 3600);
        assert!(!g.active());
    }

    #[test]
    fn returning_to_time_sync_reopens_the_gate() {
        let mut g = gate();
        g.enter_manual(3 * 3600);
        assert!(!g.active());
        g.enter_time_sync();
        assert!(g.active());
        assert!(g.time_sync());
    }

    #[test]
    fn window_change_applies_on_next_tick() {
        let mut g = gate();
        g.enter_manual(5 * 3600);
        assert!(!g.active());
        g.set_window(Some((4, 0)), Some((6, 0)));
        assert!(!g.active()); // not recomputed yet
        g.on_tick(5 * 3600);
        assert!(g.active());
    }
}
