use serde::Serialize;

/// Seconds in one 24-hour cycle; the day clock wraps at this value.
pub const SECONDS_PER_DAY: u32 = 86_400;

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// A recurring daily interval. When the end hour is earlier than the start
/// hour the window wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start_hour: 8,
            start_minute: 0,
            end_hour: 16,
            end_minute: 0,
        }
    }
}

impl TimeWindow {
    pub fn new(start_hour: u8, start_minute: u8, end_hour: u8, end_minute: u8) -> Self {
        Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        }
    }

    fn start_seconds(&self) -> u32 {
        self.start_hour as u32 * 3600 + self.start_minute as u32 * 60
    }

    fn end_seconds(&self) -> u32 {
        self.end_hour as u32 * 3600 + self.end_minute as u32 * 60
    }

    /// Whether `seconds` (offset into the day) falls inside the window.
    ///
    /// Wraparound is decided by comparing the hour fields only. A window
    /// whose end hour equals its start hour but whose end minute is at or
    /// before the start minute is NOT treated as wrapping. Deployed setups
    /// depend on that edge, so it stays.
    pub fn is_within(&self, seconds: u32) -> bool {
        let start = self.start_seconds();
        let end = self.end_seconds();
        if self.end_hour < self.start_hour {
            seconds >= start || seconds < end
        } else {
            seconds >= start && seconds < end
        }
    }

    /// Overwrite only the endpoints that are present. Used by the settime
    /// commands, where a missing query field keeps its prior value.
    pub fn merge(&mut self, start: Option<(u8, u8)>, end: Option<(u8, u8)>) {
        if let Some((h, m)) = start {
            self.start_hour = h;
            self.start_minute = m;
        }
        if let Some((h, m)) = end {
            self.end_hour = h;
            self.end_minute = m;
        }
    }

    /// "HH:MM - HH:MM", for page headers and event details.
    pub fn label(&self) -> String {
        format!(
            "{:02}:{:02} - {:02}:{:02}",
            self.start_hour, self.start_minute, self.end_hour, self.end_minute
        )
    }

    /// "HH:MM" start value for form prefills.
    pub fn start_label(&self) -> String {
        format!("{:02}:{:02}", self.start_hour, self.start_minute)
    }

    /// "HH:MM" end value for form prefills.
    pub fn end_label(&self) -> String {
        format!("{:02}:{:02}", self.end_hour, self.end_minute)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- Non-wrapping windows -------------------------------------------

    #[test]
    fn non_wrapping_inside() {
        let w = TimeWindow::new(8, 0, 16, 0);
        assert!(w.is_within(12 * 3600)); // noon
    }

    #[test]
    fn non_wrapping_before_start() {
        let w = TimeWindow::new(8, 0, 16, 0);
        assert!(!w.is_within(7 * 3600 + 3599));
    }

    #[test]
    fn non_wrapping_start_is_inclusive() {
        let w = TimeWindow::new(8, 0, 16, 0);
        assert!(w.is_within(8 * 3600));
    }

    #[test]
    fn non_wrapping_end_is_exclusive() {
        let w = TimeWindow::new(8, 0, 16, 0);
        assert!(!w.is_within(16 * 3600));
        assert!(w.is_within(16 * 3600 - 1));
    }

    #[test]
    fn minutes_shift_the_boundaries() {
        let w = TimeWindow::new(8, 30, 16, 45);
        assert!(!w.is_within(8 * 3600 + 29 * 60));
        assert!(w.is_within(8 * 3600 + 30 * 60));
        assert!(w.is_within(16 * 3600 + 44 * 60 + 59));
        assert!(!w.is_within(16 * 3600 + 45 * 60));
    }

    // -- Wrapping windows -------------------------------------------------

    #[test]
    fn wrapping_evening_side() {
        let w = TimeWindow::new(22, 0, 6, 0);
        assert!(w.is_within(23 * 3600)); // 23:00
    }

    #[test]
    fn wrapping_morning_side() {
        let w = TimeWindow::new(22, 0, 6, 0);
        assert!(w.is_within(3600)); // 01:00
    }

    #[test]
    fn wrapping_midday_outside() {
        let w = TimeWindow::new(22, 0, 6, 0);
        assert!(!w.is_within(12 * 3600)); // 12:00
    }

    #[test]
    fn wrapping_boundaries() {
        let w = TimeWindow::new(22, 0, 6, 0);
        assert!(w.is_within(22 * 3600)); // start inclusive
        assert!(!w.is_within(6 * 3600)); // end exclusive
        assert!(w.is_within(6 * 3600 - 1));
        assert!(w.is_within(SECONDS_PER_DAY - 1));
        assert!(w.is_within(0));
    }

    // -- The hour-only wraparound edge ------------------------------------

    #[test]
    fn same_hour_inverted_minutes_does_not_wrap() {
        // 10:30 .. 10:10: end <= start by minutes, but the hour comparison
        // alone decides wraparound, so this is an empty-ish forward window.
        let w = TimeWindow::new(10, 30, 10, 10);
        assert!(!w.is_within(10 * 3600 + 20 * 60)); // between end and start
        assert!(!w.is_within(11 * 3600)); // after the "start"
        assert!(!w.is_within(0)); // no morning side
    }

    // -- Merge -------------------------------------------------------------

    #[test]
    fn merge_start_only_keeps_end() {
        let mut w = TimeWindow::new(8, 0, 16, 0);
        w.merge(Some((9, 15)), None);
        assert_eq!(w, TimeWindow::new(9, 15, 16, 0));
    }

    #[test]
    fn merge_end_only_keeps_start() {
        let mut w = TimeWindow::new(8, 0, 16, 0);
        w.merge(None, Some((17, 30)));
        assert_eq!(w, TimeWindow::new(8, 0, 17, 30));
    }

    #[test]
    fn merge_none_is_a_no_op() {
        let mut w = TimeWindow::new(8, 0, 16, 0);
        w.merge(None, None);
        assert_eq!(w, TimeWindow::default());
    }

    // -- Labels --------------------------------------------------------------

    #[test]
    fn label_zero_pads() {
        let w = TimeWindow::new(7, 5, 9, 0);
        assert_eq!(w.label(), "07:05 - 09:00");
        assert_eq!(w.start_label(), "07:05");
        assert_eq!(w.end_label(), "09:00");
    }
}
