//! Relay board output via GPIO. The `gpio` feature gates the real rppal
//! driver; without it, a mock implementation logs state changes. Both
//! expose the same surface: indexed relay pins plus a status LED that
//! mirrors the system gate.

use anyhow::Result;

#[cfg(feature = "gpio")]
use rppal::gpio::{Gpio, OutputPin};

// ---------------------------------------------------------------------------
// Real GPIO board (production, requires rppal + Raspberry Pi hardware)
// ---------------------------------------------------------------------------
#[cfg(feature = "gpio")]
pub(crate) struct RelayBoard {
    relays: Vec<OutputPin>,
    status_led: OutputPin,
    active_low: bool,
}

#[cfg(feature = "gpio")]
impl RelayBoard {
    pub(crate) fn new(relay_pins: &[u8], status_led_pin: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new()?;
        let mut relays = Vec::with_capacity(relay_pins.len());

        for &pin_num in relay_pins {
            let mut pin = gpio.get(pin_num)?.into_output();

            // Fail-safe: ensure "OFF" at startup
            if active_low {
                pin.set_high();
            } else {
                pin.set_low();
            }

            relays.push(pin);
        }

        let mut status_led = gpio.get(status_led_pin)?.into_output();
        status_led.set_low(); // LED is plain active-high

        Ok(Self {
            relays,
            status_led,
            active_low,
        })
    }

    pub(crate) fn set_relay(&mut self, index: usize, on: bool) {
        let Some(pin) = self.relays.get_mut(index) else {
            return; // channel without a configured pin
        };
        // active-low relay: LOW = ON, HIGH = OFF
        if on != self.active_low {
            pin.set_high();
        } else {
            pin.set_low();
        }
        tracing::info!(relay = index + 1, "relay set {}", if on { "ON" } else { "OFF" });
    }

    pub(crate) fn set_status_led(&mut self, on: bool) {
        if on {
            self.status_led.set_high();
        } else {
            self.status_led.set_low();
        }
    }

    pub(crate) fn all_off(&mut self) {
        for i in 0..self.relays.len() {
            self.set_relay(i, false);
        }
        self.set_status_led(false);
    }
}

// ---------------------------------------------------------------------------
// Mock board (development, no hardware, logs state changes)
// ---------------------------------------------------------------------------
#[cfg(not(feature = "gpio"))]
pub(crate) struct RelayBoard {
    pub(super) relays: Vec<bool>,
    pub(super) status_led: bool,
}

#[cfg(not(feature = "gpio"))]
impl RelayBoard {
    pub(crate) fn new(relay_pins: &[u8], status_led_pin: u8, _active_low: bool) -> Result<Self> {
        for (i, pin) in relay_pins.iter().enumerate() {
            tracing::info!(relay = i + 1, pin, "[mock-gpio] registered relay (not wired)");
        }
        tracing::info!(pin = status_led_pin, "[mock-gpio] registered status led");
        Ok(Self {
            relays: vec![false; relay_pins.len()],
            status_led: false,
        })
    }

    pub(crate) fn set_relay(&mut self, index: usize, on: bool) {
        let Some(state) = self.relays.get_mut(index) else {
            return;
        };
        *state = on;
        tracing::info!(
            relay = index + 1,
            "[mock-gpio] relay set {}",
            if on { "ON" } else { "OFF" }
        );
    }

    pub(crate) fn set_status_led(&mut self, on: bool) {
        self.status_led = on;
        tracing::info!("[mock-gpio] status led {}", if on { "ON" } else { "OFF" });
    }

    pub(crate) fn all_off(&mut self) {
        for i in 0..self.relays.len() {
            self.set_relay(i, false);
        }
        self.set_status_led(false);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
