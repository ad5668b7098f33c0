//! The single owned state of the controller: clock, relay bank, gate, and
//! network settings, plus a bounded event log for the status API. All
//! mutation funnels through `apply` (commands) and `tick` (driver loop)
//! under one lock, so access stays linearizable.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::info;

use crate::clock::DayClock;
use crate::command::Command;
use crate::config::{AuthConfig, Variant};
use crate::gate::SystemGate;
use crate::netif::NetworkSettings;
use crate::relay::{RelayBank, RelayMode, RELAY_COUNT};
use crate::window::TimeWindow;

/// Maximum number of events retained in the ring buffer.
const MAX_EVENTS: usize = 200;

pub type SharedState = Arc<RwLock<ControllerState>>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

pub struct ControllerState {
    pub variant: Variant,
    pub clock: DayClock,
    pub bank: RelayBank,
    pub gate: SystemGate,
    pub network: NetworkSettings,
    auth: AuthConfig,
    started_at: Instant,
    pub events: VecDeque<ControllerEvent>,
}

/// Which page the web layer renders after a command is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Control,
    Login,
    ConfigSaved,
}

pub struct Applied {
    pub view: View,
    /// Set when `/setnetwork` changed anything; the caller re-applies the
    /// settings through the network interface collaborator.
    pub network_changed: bool,
}

#[derive(Clone, Serialize)]
pub struct ControllerEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Command,
    Gate,
    Probe,
    Network,
    System,
}

// ---------------------------------------------------------------------------
// JSON response (what /api/status returns)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub variant: Variant,
    pub system_active: bool,
    pub time_sync: bool,
    pub clock_seconds: u32,
    pub window: String,
    pub relays: Vec<RelayStatus>,
    pub network: NetworkSettings,
    pub events: Vec<ControllerEvent>,
}

#[derive(Serialize)]
pub struct RelayStatus {
    pub index: usize,
    pub mode: RelayMode,
    pub manual_on: bool,
    pub effective: bool,
    /// What the pin actually carries: gate AND effective.
    pub output: bool,
}

// ---------------------------------------------------------------------------
// Construction & mutation
// ---------------------------------------------------------------------------

impl ControllerState {
    pub fn new(
        variant: Variant,
        window: TimeWindow,
        network: NetworkSettings,
        auth: AuthConfig,
    ) -> Self {
        let bank = match variant {
            Variant::Multi => RelayBank::with_modes([
                RelayMode::Time,
                RelayMode::Api,
                RelayMode::Temp,
                RelayMode::Basic,
            ]),
            Variant::Linked => RelayBank::default(),
        };

        Self {
            variant,
            clock: DayClock::new(),
            bank,
            gate: SystemGate::new(window),
            network,
            auth,
            started_at: Instant::now(),
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn system_active(&self) -> bool {
        self.gate.active()
    }

    /// Relative URL that re-enters the control view. Credentials ride in
    /// the query string, as the login form submits them; this surface is
    /// not a security boundary.
    pub fn control_path(&self) -> String {
        format!("/login?user={}&pass={}", self.auth.user, self.auth.pass)
    }

    /// One driver-loop second: advance the day clock and recompute the
    /// gate. Idle while time-synced, since the external authority owns
    /// the notion of "now".
    pub fn tick(&mut self) {
        if self.gate.time_sync() {
            return;
        }
        self.clock.tick();
        let was_active = self.gate.active();
        self.gate.on_tick(self.clock.seconds());
        if was_active != self.gate.active() {
            self.record(
                EventKind::Gate,
                format!(
                    "window {}: system {}",
                    self.gate.window().label(),
                    if self.gate.active() { "ACTIVE" } else { "INACTIVE" }
                ),
            );
        }
    }

    /// Desired physical pin levels, relay1 first: gate AND per-relay
    /// effective state.
    pub fn outputs(&self) -> [bool; RELAY_COUNT] {
        core::array::from_fn(|i| {
            self.gate.active() && self.bank.effective_state(i, self.clock.seconds())
        })
    }

    /// Consume the result of a liveness probe. A failure forces the
    /// relay's manual flag off, dropping the pin at that moment; it does
    /// not latch, so a later command turns the relay back on without
    /// waiting for the peer to answer.
    pub fn probe_result(&mut self, ok: bool) {
        if !ok {
            self.bank.set_manual(0, false);
            self.record(
                EventKind::Probe,
                "peer unreachable: relay forced off".to_string(),
            );
        }
    }

    // -- Command application ---------------------------------------------

    pub fn apply(&mut self, cmd: Command) -> Applied {
        match self.variant {
            Variant::Multi => self.apply_multi(cmd),
            Variant::Linked => self.apply_linked(cmd),
        }
    }

    /// Multi-relay board: every request, recognized or not, lands back on
    /// the dashboard. Linked-only commands are deliberate no-ops here.
    fn apply_multi(&mut self, cmd: Command) -> Applied {
        let mut network_changed = false;

        match cmd {
            Command::Relay { index, on } => {
                self.bank.set_manual(index, on);
                self.record(
                    EventKind::Command,
                    format!("relay{} manual {}", index + 1, onoff(on)),
                );
            }
            Command::SetMode { index, mode } => {
                self.bank.set_mode(index, mode);
                self.record(
                    EventKind::Command,
                    format!("relay{} mode set to {}", index + 1, mode.as_str()),
                );
            }
            Command::SetRelayWindow { index, start, end } => {
                self.bank.set_window(index, start, end);
                self.record(
                    EventKind::Command,
                    format!(
                        "relay{} window set to {}",
                        index + 1,
                        self.bank.entry(index).window.label()
                    ),
                );
            }
            Command::SetGlobalWindow { start, end } => {
                self.gate.set_window(start, end);
                self.record(
                    EventKind::Command,
                    format!("active window set to {}", self.gate.window().label()),
                );
            }
            Command::SetApiEndpoint { index, endpoint } => {
                if let Some(endpoint) = endpoint {
                    self.record(
                        EventKind::Command,
                        format!("relay{} api endpoint set to {endpoint}", index + 1),
                    );
                    self.bank.set_api_endpoint(index, endpoint);
                }
            }
            Command::SetThresholds { index, update } => {
                self.bank.set_thresholds(index, update);
                let t = self.bank.entry(index).thresholds;
                self.record(
                    EventKind::Command,
                    format!(
                        "relay{} thresholds set to temp {}..{} hum {}..{}",
                        index + 1,
                        t.temp_min,
                        t.temp_max,
                        t.hum_min,
                        t.hum_max
                    ),
                );
            }
            Command::TimeSync => {
                self.gate.enter_time_sync();
                self.record(EventKind::Gate, "time-sync mode: system ACTIVE".to_string());
            }
            Command::ManualTime => {
                self.gate.enter_manual(self.clock.seconds());
                self.record(
                    EventKind::Gate,
                    format!(
                        "manual mode, window {}: system {}",
                        self.gate.window().label(),
                        if self.gate.active() { "ACTIVE" } else { "INACTIVE" }
                    ),
                );
            }
            Command::SetNetwork {
                ip,
                subnet,
                gateway,
                dns,
            } => {
                if ip.is_some() || subnet.is_some() || gateway.is_some() || dns.is_some() {
                    if let Some(v) = ip {
                        self.network.ip = v;
                    }
                    if let Some(v) = subnet {
                        self.network.subnet = v;
                    }
                    if let Some(v) = gateway {
                        self.network.gateway = v;
                    }
                    if let Some(v) = dns {
                        self.network.dns = v;
                    }
                    network_changed = true;
                    self.record(
                        EventKind::Network,
                        format!("network settings changed, ip {}", self.network.ip),
                    );
                }
            }
            // Linked-variant surface and unknown paths: no state change,
            // the current dashboard still renders.
            Command::Login { .. }
            | Command::Power { .. }
            | Command::NetConfig
            | Command::Unrecognized => {}
        }

        Applied {
            view: View::Dashboard,
            network_changed,
        }
    }

    /// Linked pair: a login gate in front of a single relay. Anything
    /// outside the small control surface, including a failed login,
    /// renders the login view and mutates nothing.
    fn apply_linked(&mut self, cmd: Command) -> Applied {
        let view = match cmd {
            Command::Login { user, pass } => {
                if user == self.auth.user && pass == self.auth.pass {
                    View::Control
                } else {
                    View::Login
                }
            }
            Command::Power { on } => {
                self.bank.set_manual(0, on);
                self.record(EventKind::Command, format!("relay manual {}", onoff(on)));
                View::Control
            }
            Command::NetConfig => {
                self.record(
                    EventKind::Network,
                    "netconfig acknowledged (not stored)".to_string(),
                );
                View::ConfigSaved
            }
            _ => View::Login,
        };

        Applied {
            view,
            network_changed: false,
        }
    }

    // -- Events ------------------------------------------------------------

    pub fn record_system(&mut self, detail: String) {
        self.record(EventKind::System, detail);
    }

    fn record(&mut self, kind: EventKind, detail: String) {
        info!(?kind, "{detail}");
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(ControllerEvent {
            ts: OffsetDateTime::now_utc(),
            kind,
            detail,
        });
    }

    // -- Status snapshot -----------------------------------------------------

    pub fn to_status(&self) -> StatusResponse {
        let relays = (0..RELAY_COUNT)
            .map(|i| {
                let entry = self.bank.entry(i);
                let effective = self.bank.effective_state(i, self.clock.seconds());
                RelayStatus {
                    index: i,
                    mode: entry.mode,
                    manual_on: entry.manual_on,
                    effective,
                    output: self.gate.active() && effective,
                }
            })
            .collect();

        StatusResponse {
            uptime_secs: self.started_at.elapsed().as_secs(),
            variant: self.variant,
            system_active: self.gate.active(),
            time_sync: self.gate.time_sync(),
            clock_seconds: self.clock.seconds(),
            window: self.gate.window().label(),
            relays,
            network: self.network,
            events: self.events.iter().rev().cloned().collect(),
        }
    }
}

fn onoff(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

// ===========================================================================
// Tests
// ===========================================================================
