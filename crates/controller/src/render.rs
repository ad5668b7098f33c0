//! HTML page emission: static templates with `%TOKEN%` substitution,
//! parameterized by a snapshot of the controller state. No decision logic
//! lives here; the view was already chosen when the command was applied.

use std::fmt::Write;

use crate::relay::{RelayMode, RELAY_COUNT};
use crate::state::{ControllerState, View};

const DASHBOARD_PAGE: &str = include_str!("ui/dashboard.html");
const LOGIN_PAGE: &str = include_str!("ui/login.html");
const CONTROL_PAGE: &str = include_str!("ui/control.html");

pub fn page(view: View, st: &ControllerState) -> String {
    match view {
        View::Dashboard => dashboard(st),
        View::Control => control(st),
        View::Login => LOGIN_PAGE.to_string(),
        View::ConfigSaved => config_saved(st),
    }
}

// ---------------------------------------------------------------------------
// Linked variant pages
// ---------------------------------------------------------------------------

fn control(st: &ControllerState) -> String {
    CONTROL_PAGE.replace("%STATE%", onoff(st.bank.entry(0).manual_on))
}

/// The back link re-enters the control view rather than bouncing the
/// operator through a fresh login.
fn config_saved(st: &ControllerState) -> String {
    format!(
        "<html><body><h2>Settings Saved (not stored yet)</h2><a href='{}'>Back</a></body></html>",
        st.control_path()
    )
}

// ---------------------------------------------------------------------------
// Multi variant dashboard
// ---------------------------------------------------------------------------

fn dashboard(st: &ControllerState) -> String {
    let window = st.gate.window();

    DASHBOARD_PAGE
        .replace("%STATUS%", status_span(st.system_active()))
        .replace(
            "%TIME_MODE%",
            if st.gate.time_sync() { "NTP" } else { "Manual" },
        )
        .replace("%WINDOW%", &window.label())
        .replace("%RELAY_SUMMARY%", &relay_summary(st))
        .replace("%RELAY_SECTIONS%", &relay_sections(st))
        .replace("%START%", &window.start_label())
        .replace("%END%", &window.end_label())
        .replace("%IP%", &st.network.ip.to_string())
        .replace("%SUBNET%", &st.network.subnet.to_string())
        .replace("%GATEWAY%", &st.network.gateway.to_string())
        .replace("%DNS%", &st.network.dns.to_string())
}

/// " | R1: ON | R2: OFF ..." for the fixed status header.
fn relay_summary(st: &ControllerState) -> String {
    let mut s = String::new();
    for i in 0..RELAY_COUNT {
        let effective = st.bank.effective_state(i, st.clock.seconds());
        let _ = write!(s, " | R{}: {}", i + 1, onoff(effective));
    }
    s
}

fn relay_sections(st: &ControllerState) -> String {
    (0..RELAY_COUNT).map(|i| relay_section(st, i)).collect()
}

fn relay_section(st: &ControllerState, i: usize) -> String {
    let entry = st.bank.entry(i);
    let effective = st.bank.effective_state(i, st.clock.seconds());
    let n = i + 1;

    let mut s = format!(
        "<div class='relay'><h3>Relay {n}: <span class='{}'>{}</span></h3>\n",
        if effective { "on" } else { "off" },
        onoff(effective)
    );
    let _ = write!(
        s,
        "<p>Mode: {} | Manual: {}</p>\n",
        entry.mode.as_str(),
        onoff(entry.manual_on)
    );
    let _ = write!(
        s,
        "<a href='/relay{n}/on'><button class='toggle' style='background:#0c9;color:#fff;'>ON</button></a>\n\
         <a href='/relay{n}/off'><button class='toggle' style='background:#e44;color:#fff;'>OFF</button></a>\n"
    );

    s.push_str("<p class='mode-links'>Set mode:");
    for mode in [
        RelayMode::Basic,
        RelayMode::Time,
        RelayMode::Api,
        RelayMode::Temp,
    ] {
        let tok = mode.as_str();
        let marker = if entry.mode == mode { "<strong>" } else { "" };
        let close = if entry.mode == mode { "</strong>" } else { "" };
        let _ = write!(s, " <a href='/relay{n}/mode/{tok}'>{marker}{tok}{close}</a>");
    }
    s.push_str("</p>\n");

    match entry.mode {
        RelayMode::Time => {
            let _ = write!(
                s,
                "<form action='/relay{n}/settime' method='get'>\
                 Start: <input type='time' name='start' value='{}'> \
                 End: <input type='time' name='end' value='{}'> \
                 <button type='submit'>Save</button></form>\n",
                entry.window.start_label(),
                entry.window.end_label()
            );
        }
        RelayMode::Api => {
            let _ = write!(
                s,
                "<form action='/relay{n}/setapi' method='get'>\
                 Endpoint: <input type='text' name='endpoint' value='{}'> \
                 <button type='submit'>Save</button></form>\n",
                entry.api_endpoint
            );
        }
        RelayMode::Temp => {
            let t = entry.thresholds;
            let _ = write!(
                s,
                "<form action='/relay{n}/settemp' method='get'>\
                 Temp <input type='number' step='0.1' name='tempMin' value='{}'> .. \
                 <input type='number' step='0.1' name='tempMax' value='{}'> \
                 Humidity <input type='number' step='0.1' name='humMin' value='{}'> .. \
                 <input type='number' step='0.1' name='humMax' value='{}'> \
                 <button type='submit'>Save</button></form>\n",
                t.temp_min, t.temp_max, t.hum_min, t.hum_max
            );
        }
        RelayMode::Basic => {}
    }

    s.push_str("</div>\n");
    s
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

fn status_span(active: bool) -> &'static str {
    if active {
        "<span class='on'>ACTIVE</span>"
    } else {
        "<span class='off'>INACTIVE</span>"
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
