//! The relay bank: four independently configured output channels, each
//! with a manual on/off flag, an operating mode, and per-mode settings.
//! All per-mode fields persist across mode switches, so flipping a relay
//! to `basic` and back to `time` does not lose its window.

use serde::Serialize;

use crate::window::TimeWindow;

/// Fixed number of relay channels (indices 0..=3, wire names relay1..relay4).
pub const RELAY_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Operating modes
// ---------------------------------------------------------------------------

/// How a relay's effective output is derived. Mode tokens arrive as free
/// text on the wire; unrecognized tokens fall back to `Basic`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    #[default]
    Basic,
    Time,
    Api,
    Temp,
}

impl RelayMode {
    pub fn from_token(token: &str) -> Self {
        match token {
            "basic" => Self::Basic,
            "time" => Self::Time,
            "api" => Self::Api,
            "temp" => Self::Temp,
            _ => Self::Basic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Time => "time",
            Self::Api => "api",
            Self::Temp => "temp",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-relay settings
// ---------------------------------------------------------------------------

/// Temperature/humidity trigger thresholds. Stored configuration only:
/// no sensor input is wired in, so these never influence the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub temp_min: f32,
    pub temp_max: f32,
    pub hum_min: f32,
    pub hum_max: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_min: 20.0,
            temp_max: 30.0,
            hum_min: 30.0,
            hum_max: 70.0,
        }
    }
}

/// Partial threshold update from a settemp command. Absent fields keep
/// their prior value (field-level atomicity).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdUpdate {
    pub temp_min: Option<f32>,
    pub temp_max: Option<f32>,
    pub hum_min: Option<f32>,
    pub hum_max: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelayEntry {
    pub manual_on: bool,
    pub mode: RelayMode,
    pub window: TimeWindow,
    pub api_endpoint: String,
    pub thresholds: Thresholds,
}

// ---------------------------------------------------------------------------
// Bank
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RelayBank {
    relays: [RelayEntry; RELAY_COUNT],
}

impl Default for RelayBank {
    fn default() -> Self {
        Self {
            relays: core::array::from_fn(|_| RelayEntry::default()),
        }
    }
}

impl RelayBank {
    /// Bank with preset startup modes, e.g. the multi-relay board boots
    /// with relay1=time, relay2=api, relay3=temp, relay4=basic.
    pub fn with_modes(modes: [RelayMode; RELAY_COUNT]) -> Self {
        let mut bank = Self::default();
        for (entry, mode) in bank.relays.iter_mut().zip(modes) {
            entry.mode = mode;
        }
        bank
    }

    pub fn entry(&self, index: usize) -> &RelayEntry {
        &self.relays[index]
    }

    pub fn set_manual(&mut self, index: usize, on: bool) {
        self.relays[index].manual_on = on;
    }

    pub fn set_mode(&mut self, index: usize, mode: RelayMode) {
        self.relays[index].mode = mode;
    }

    pub fn set_window(&mut self, index: usize, start: Option<(u8, u8)>, end: Option<(u8, u8)>) {
        self.relays[index].window.merge(start, end);
    }

    pub fn set_api_endpoint(&mut self, index: usize, endpoint: String) {
        self.relays[index].api_endpoint = endpoint;
    }

    pub fn set_thresholds(&mut self, index: usize, update: ThresholdUpdate) {
        let t = &mut self.relays[index].thresholds;
        if let Some(v) = update.temp_min {
            t.temp_min = v;
        }
        if let Some(v) = update.temp_max {
            t.temp_max = v;
        }
        if let Some(v) = update.hum_min {
            t.hum_min = v;
        }
        if let Some(v) = update.hum_max {
            t.hum_max = v;
        }
    }

    /// The relay's mode-derived output, before the system gate is applied.
    ///
    /// In `Time` mode the window alone decides; the manual flag is not
    /// consulted while that mode is active. `Api` and `Temp` triggers are
    /// unimplemented placeholders and behave as `Basic` (manual control).
    pub fn effective_state(&self, index: usize, clock_seconds: u32) -> bool {
        let entry = &self.relays[index];
        match entry.mode {
            RelayMode::Time => entry.window.is_within(clock_seconds),
            RelayMode::Basic | RelayMode::Api | RelayMode::Temp => entry.manual_on,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
