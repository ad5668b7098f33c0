//! Periodic reachability probe of the peer device (linked variant). A
//! failed probe forces the relay off at that moment; a later command can
//! turn it back on while the peer is still down. The probe runs on its
//! own interval task and never blocks request handling.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::state::SharedState;

#[derive(Debug, Clone, Copy)]
pub struct ProbeSettings {
    pub target: SocketAddr,
    pub interval: Duration,
    pub timeout: Duration,
}

/// Run the probe loop. Intended to be `tokio::spawn`-ed from main.
pub async fn run(shared: SharedState, settings: ProbeSettings) {
    let mut ticker = tokio::time::interval(settings.interval);
    // An interval fires immediately; skip that first tick so the peer has
    // one full interval to come up before the interlock can trip.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let ok = check(settings.target, settings.timeout).await;
        if ok {
            debug!(target = %settings.target, "probe ok");
        } else {
            warn!(target = %settings.target, "probe failed, forcing relay off");
        }
        let mut st = shared.write().await;
        st.probe_result(ok);
    }
}

/// TCP reachability check bounded by `timeout`.
pub async fn check(target: SocketAddr, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(target)).await,
        Ok(Ok(_))
    )
}

// ===========================================================================
// Tests
// ===========================================================================
