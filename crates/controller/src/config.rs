//! TOML config file loading and validation. The controller runs fine with
//! no file at all: every field has a compiled-in default.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::netif::NetworkSettings;
use crate::probe::ProbeSettings;
use crate::window::TimeWindow;

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

/// Which controller personality to run. The two variants share the core
/// but diverge in login gating, liveness probing, and fallback rendering;
/// they are deliberately not unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Single board, four relays, open dashboard.
    Multi,
    /// Two linked devices, one relay, login gate plus peer probe.
    Linked,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: Variant,
    pub auth: AuthConfig,
    pub network: NetworkConfig,
    pub window: WindowConfig,
    pub board: BoardConfig,
    pub probe: ProbeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: Variant::Multi,
            auth: AuthConfig::default(),
            network: NetworkConfig::default(),
            window: WindowConfig::default(),
            board: BoardConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

/// Login credentials for the linked variant. A literal string match, kept
/// for its gating behavior; this is not a security boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub user: String,
    pub pass: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user: "admin".to_string(),
            pass: "1234".to_string(),
        }
    }
}

/// Static address overrides. Unset fields fall back to the variant's
/// compiled-in defaults; all of them stay mutable at runtime through
/// `/setnetwork`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub ip: Option<Ipv4Addr>,
    pub subnet: Option<Ipv4Addr>,
    pub gateway: Option<Ipv4Addr>,
    pub dns: Option<Ipv4Addr>,
}

/// The global active window, as "HH:MM" strings. Config values are parsed
/// strictly, unlike the permissive wire grammar.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: "08:00".to_string(),
            end: "16:00".to_string(),
        }
    }
}

impl WindowConfig {
    pub fn to_window(&self) -> Result<TimeWindow> {
        let (start_hour, start_minute) = parse_hhmm_strict(&self.start)
            .with_context(|| format!("window.start '{}'", self.start))?;
        let (end_hour, end_minute) = parse_hhmm_strict(&self.end)
            .with_context(|| format!("window.end '{}'", self.end))?;
        Ok(TimeWindow::new(start_hour, start_minute, end_hour, end_minute))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// One GPIO pin per relay channel, relay1 first. The linked variant
    /// typically lists a single pin.
    pub relay_pins: Vec<u8>,
    pub status_led_pin: u8,
    /// Most common relay boards are active-low.
    pub active_low: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            relay_pins: vec![5, 6, 7, 8],
            status_led_pin: 13,
            active_low: true,
        }
    }
}

/// Peer reachability probe (linked variant only).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub target: Ipv4Addr,
    pub port: u16,
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target: Ipv4Addr::new(192, 168, 1, 31),
            port: 80,
            interval_secs: 300,
            timeout_secs: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// GPIO whitelist
// ---------------------------------------------------------------------------

/// BCM GPIO pins available on the Raspberry Pi 40-pin header for general
/// use. GPIO 0-1 are reserved for the ID EEPROM and must never be used.
const VALID_GPIO_PINS: &[u8] = &[
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
];

/// Relay channels supported by the bank.
const MAX_RELAYS: usize = crate::relay::RELAY_COUNT;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if let Err(e) = self.window.to_window() {
            errors.push(format!("{e:#}"));
        }

        self.validate_board(&mut errors);
        self.validate_probe(&mut errors);

        if self.variant == Variant::Linked {
            if self.auth.user.trim().is_empty() {
                errors.push("auth.user is empty".to_string());
            }
            if self.auth.pass.trim().is_empty() {
                errors.push("auth.pass is empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_board(&self, errors: &mut Vec<String>) {
        if self.board.relay_pins.is_empty() {
            errors.push("board.relay_pins is empty".to_string());
        }
        if self.board.relay_pins.len() > MAX_RELAYS {
            errors.push(format!(
                "board.relay_pins lists {} pins, the bank has {MAX_RELAYS} channels",
                self.board.relay_pins.len()
            ));
        }

        let mut seen: HashSet<u8> = HashSet::new();
        for &pin in &self.board.relay_pins {
            if !VALID_GPIO_PINS.contains(&pin) {
                errors.push(format!(
                    "board.relay_pins: {pin} is not a valid BCM GPIO pin (allowed: 2-27)"
                ));
            } else if !seen.insert(pin) {
                errors.push(format!("board.relay_pins: pin {pin} listed twice"));
            }
        }

        if !VALID_GPIO_PINS.contains(&self.board.status_led_pin) {
            errors.push(format!(
                "board.status_led_pin {} is not a valid BCM GPIO pin (allowed: 2-27)",
                self.board.status_led_pin
            ));
        } else if seen.contains(&self.board.status_led_pin) {
            errors.push(format!(
                "board.status_led_pin {} is already used by a relay",
                self.board.status_led_pin
            ));
        }
    }

    fn validate_probe(&self, errors: &mut Vec<String>) {
        if self.probe.interval_secs == 0 {
            errors.push("probe.interval_secs must be positive".to_string());
        }
        if self.probe.timeout_secs == 0 {
            errors.push("probe.timeout_secs must be positive".to_string());
        }
        if self.probe.timeout_secs >= self.probe.interval_secs {
            errors.push(format!(
                "probe.timeout_secs ({}) must be below probe.interval_secs ({})",
                self.probe.timeout_secs, self.probe.interval_secs
            ));
        }
    }

    // -- Derived runtime settings -------------------------------------------

    /// Config overrides merged over the variant's compiled-in defaults.
    pub fn network_settings(&self) -> NetworkSettings {
        let defaults = NetworkSettings::defaults_for(self.variant);
        NetworkSettings {
            ip: self.network.ip.unwrap_or(defaults.ip),
            subnet: self.network.subnet.unwrap_or(defaults.subnet),
            gateway: self.network.gateway.unwrap_or(defaults.gateway),
            dns: self.network.dns.unwrap_or(defaults.dns),
        }
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            target: SocketAddr::from((self.probe.target, self.probe.port)),
            interval: Duration::from_secs(self.probe.interval_secs),
            timeout: Duration::from_secs(self.probe.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file. A missing file is not an
/// error: the compiled-in defaults apply.
pub fn load_or_default(path: &str) -> Result<Config> {
    let config = if std::path::Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?
    } else {
        tracing::info!(path, "no config file found, using built-in defaults");
        Config::default()
    };
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

/// Strict "HH:MM" parse for config values (the wire grammar is looser on
/// purpose and lives in the command parser).
fn parse_hhmm_strict(value: &str) -> Result<(u8, u8)> {
    let Some((h, m)) = value.split_once(':') else {
        bail!("expected HH:MM");
    };
    let hour: u8 = h.parse().context("hour is not a number")?;
    let minute: u8 = m.parse().context("minute is not a number")?;
    if hour > 23 {
        bail!("hour {hour} out of range [0, 23]");
    }
    if minute > 59 {
        bail!("minute {minute} out of range [0, 59]");
    }
    Ok((hour, minute))
}

// ===========================================================================
// Tests
// ===========================================================================
