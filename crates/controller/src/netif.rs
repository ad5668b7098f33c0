use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::info;

use crate::config::Variant;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkSettings {
    pub ip: Ipv4Addr,
    pub subnet: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub dns: Ipv4Addr,
}

impl NetworkSettings {
    /// Compiled-in defaults, per variant.
    pub fn defaults_for(variant: Variant) -> Self {
        match variant {
            Variant::Multi => Self {
                ip: Ipv4Addr::new(172, 16, 254, 250),
                subnet: Ipv4Addr::new(255, 255, 255, 0),
                gateway: Ipv4Addr::new(172, 16, 254, 1),
                dns: Ipv4Addr::new(8, 8, 8, 8),
            },
            Variant::Linked => Self {
                ip: Ipv4Addr::new(192, 168, 1, 30),
                subnet: Ipv4Addr::new(255, 255, 255, 0),
                gateway: Ipv4Addr::new(192, 168, 1, 1),
                dns: Ipv4Addr::new(8, 8, 8, 8),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Interface boundary
// ---------------------------------------------------------------------------

/// Seam for interface reconfiguration. `/setnetwork` takes effect by
/// handing the merged settings to this collaborator; dropping in-flight
/// connections during reconfiguration is acceptable.
pub trait NetworkInterface: Send + Sync {
    fn apply(&self, settings: &NetworkSettings);
}

/// Default implementation: records the requested settings. Actual
/// interface bring-up is platform plumbing outside this daemon.
pub struct LogOnlyInterface;

impl NetworkInterface for LogOnlyInterface {
    fn apply(&self, settings: &NetworkSettings) {
        info!(
            ip = %settings.ip,
            subnet = %settings.subnet,
            gateway = %settings.gateway,
            dns = %settings.dns,
            "network settings applied"
        );
    }
}

// ===========================================================================
// Tests
// ===========================================================================
