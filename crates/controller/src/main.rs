mod board;
mod clock;
mod command;
mod config;
mod gate;
mod netif;
mod probe;
mod relay;
mod render;
mod state;
mod web;
mod window;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use board::RelayBoard;
use config::Variant;
use netif::LogOnlyInterface;
use relay::RELAY_COUNT;
use state::{ControllerState, SharedState};
use web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "controller.toml".to_string());
    let cfg = config::load_or_default(&config_path)?;
    let window = cfg.window.to_window()?;
    info!(variant = ?cfg.variant, window = %window.label(), "controller starting");

    // ── Relay board ─────────────────────────────────────────────────
    let mut relay_board = RelayBoard::new(
        &cfg.board.relay_pins,
        cfg.board.status_led_pin,
        cfg.board.active_low,
    )?;
    relay_board.all_off();

    // ── Shared state ────────────────────────────────────────────────
    let shared: SharedState = Arc::new(RwLock::new(ControllerState::new(
        cfg.variant,
        window,
        cfg.network_settings(),
        cfg.auth.clone(),
    )));
    {
        let mut st = shared.write().await;
        st.record_system("controller started".to_string());
    }

    // ── Web server ──────────────────────────────────────────────────
    let app = AppState {
        shared: Arc::clone(&shared),
        netif: Arc::new(LogOnlyInterface),
    };
    tokio::spawn(async move {
        web::serve(app).await;
    });

    // ── Peer probe (linked variant only) ────────────────────────────
    if cfg.variant == Variant::Linked {
        let probe_state = Arc::clone(&shared);
        let settings = cfg.probe_settings();
        info!(target = %settings.target, "peer probe enabled");
        tokio::spawn(async move {
            probe::run(probe_state, settings).await;
        });
    }

    run_driver(shared, relay_board).await
}

/// The 1 Hz driver loop: advance the clock, then push the resulting pin
/// levels to the board. Writes are deduplicated, so pins are only touched
/// on transitions.
async fn run_driver(shared: SharedState, mut board: RelayBoard) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut last_outputs: [Option<bool>; RELAY_COUNT] = [None; RELAY_COUNT];
    let mut last_led: Option<bool> = None;

    loop {
        ticker.tick().await;

        let (outputs, active) = {
            let mut st = shared.write().await;
            st.tick();
            (st.outputs(), st.system_active())
        };

        for (i, &on) in outputs.iter().enumerate() {
            if last_outputs[i] != Some(on) {
                board.set_relay(i, on);
                last_outputs[i] = Some(on);
            }
        }
        if last_led != Some(active) {
            board.set_status_led(active);
            last_led = Some(active);
        }
    }
}
