//! Request-line command parser. The HTTP transport is a collaborator; the
//! core consumes only the first line of each request ("GET /path?query
//! HTTP/1.1") and turns it into a structured command.
//!
//! Query strings go through a real tokenizer: handlers read named keys,
//! so reordered or missing fields cannot corrupt their neighbors. A key
//! that is absent leaves the corresponding state field unchanged.

use std::net::Ipv4Addr;

use tracing::warn;

use crate::relay::{RelayMode, ThresholdUpdate};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/login?user=&pass=` (linked variant; exact-string match downstream).
    Login { user: String, pass: String },
    /// `/on` and `/off`: the linked variant's single-relay toggle.
    Power { on: bool },
    /// `/relayN/on|off`.
    Relay { index: usize, on: bool },
    /// `/relayN/mode/<token>`; unknown tokens map to basic.
    SetMode { index: usize, mode: RelayMode },
    /// `/relayN/settime?start=HH:MM&end=HH:MM`; absent key keeps the field.
    SetRelayWindow {
        index: usize,
        start: Option<(u8, u8)>,
        end: Option<(u8, u8)>,
    },
    /// `/settime?start=HH:MM&end=HH:MM` against the global window.
    SetGlobalWindow {
        start: Option<(u8, u8)>,
        end: Option<(u8, u8)>,
    },
    /// `/relayN/setapi?endpoint=`; only `%2F` and `%3A` are decoded.
    SetApiEndpoint {
        index: usize,
        endpoint: Option<String>,
    },
    /// `/relayN/settemp?tempMin=&tempMax=&humMin=&humMax=`.
    SetThresholds { index: usize, update: ThresholdUpdate },
    /// `/ntp`: enter time-sync mode, force the gate open.
    TimeSync,
    /// `/manual`: follow the global window from now on.
    ManualTime,
    /// `/setnetwork?ip=&subnet=&gateway=&dns=`; bad quads are dropped.
    SetNetwork {
        ip: Option<Ipv4Addr>,
        subnet: Option<Ipv4Addr>,
        gateway: Option<Ipv4Addr>,
        dns: Option<Ipv4Addr>,
    },
    /// `/netconfig?...`: acknowledged but not applied (linked variant).
    NetConfig,
    /// Anything outside the grammar. Fallback behavior is per variant.
    Unrecognized,
}

// ---------------------------------------------------------------------------
// Query tokenizer
// ---------------------------------------------------------------------------

struct Query<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Query<'a> {
    fn parse(raw: &'a str) -> Self {
        let pairs = raw
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| p.split_once('=').unwrap_or((p, "")))
            .collect();
        Self { pairs }
    }

    /// First value for `key`, if present.
    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|&(_, v)| v)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse(request_line: &str) -> Command {
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Command::Unrecognized;
    };
    if method != "GET" {
        return Command::Unrecognized;
    }

    let (path, raw_query) = match target.split_once('?') {
        Some((p, q)) => (p, q),
        None => (target, ""),
    };
    let query = Query::parse(raw_query);

    match path {
        "/on" => Command::Power { on: true },
        "/off" => Command::Power { on: false },
        "/ntp" => Command::TimeSync,
        "/manual" => Command::ManualTime,
        "/login" => Command::Login {
            user: query.get("user").unwrap_or("").to_string(),
            pass: query.get("pass").unwrap_or("").to_string(),
        },
        "/settime" => Command::SetGlobalWindow {
            start: query.get("start").map(parse_hhmm),
            end: query.get("end").map(parse_hhmm),
        },
        "/setnetwork" => Command::SetNetwork {
            ip: parse_quad(query.get("ip")),
            subnet: parse_quad(query.get("subnet")),
            gateway: parse_quad(query.get("gateway")),
            dns: parse_quad(query.get("dns")),
        },
        "/netconfig" => Command::NetConfig,
        _ => parse_relay(path, &query),
    }
}

fn parse_relay(path: &str, query: &Query) -> Command {
    let Some(rest) = path.strip_prefix("/relay") else {
        return Command::Unrecognized;
    };
    let Some((index_token, action)) = rest.split_once('/') else {
        return Command::Unrecognized;
    };
    // The grammar only names relay1..relay4; anything else never reaches
    // the bank, which is why the setters can index unconditionally.
    let index = match index_token {
        "1" => 0,
        "2" => 1,
        "3" => 2,
        "4" => 3,
        _ => return Command::Unrecognized,
    };

    if let Some(token) = action.strip_prefix("mode/") {
        return Command::SetMode {
            index,
            mode: RelayMode::from_token(token),
        };
    }

    match action {
        "on" => Command::Relay { index, on: true },
        "off" => Command::Relay { index, on: false },
        "settime" => Command::SetRelayWindow {
            index,
            start: query.get("start").map(parse_hhmm),
            end: query.get("end").map(parse_hhmm),
        },
        "setapi" => Command::SetApiEndpoint {
            index,
            endpoint: query.get("endpoint").map(decode_endpoint),
        },
        "settemp" => Command::SetThresholds {
            index,
            update: ThresholdUpdate {
                temp_min: parse_float(query.get("tempMin")),
                temp_max: parse_float(query.get("tempMax")),
                hum_min: parse_float(query.get("humMin")),
                hum_max: parse_float(query.get("humMax")),
            },
        },
        _ => Command::Unrecognized,
    }
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// "HH:MM" into (hour, minute). A non-numeric piece parses as 0; devices
/// in the field rely on this lenient conversion.
fn parse_hhmm(value: &str) -> (u8, u8) {
    let (h, m) = value.split_once(':').unwrap_or((value, ""));
    (h.parse().unwrap_or(0), m.parse().unwrap_or(0))
}

/// Endpoint values decode exactly two escapes, `%2F` and `%3A`. There is
/// deliberately no general percent-decoding here.
fn decode_endpoint(raw: &str) -> String {
    raw.replace("%2F", "/").replace("%3A", ":")
}

fn parse_float(value: Option<&str>) -> Option<f32> {
    value.and_then(|v| v.parse().ok())
}

fn parse_quad(value: Option<&str>) -> Option<Ipv4Addr> {
    let raw = value?;
    match raw.parse() {
        Ok(addr) => Some(addr),
        Err(_) => {
            warn!(address = raw, "dropping malformed dotted-quad field");
            None
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- Method / shape ---------------------------------------------------

    #[test]
    fn rejects_non_get_methods() {
        assert_eq!(parse("POST /on HTTP/1.1"), Command::Unrecognized);
        assert_eq!(parse("PUT /relay1/on HTTP/1.1"), Command::Unrecognized);
    }

    #[test]
    fn rejects_empty_and_truncated_lines() {
        assert_eq!(parse(""), Command::Unrecognized);
        assert_eq!(parse("GET"), Command::Unrecognized);
    }

    #[test]
    fn missing_protocol_token_still_parses() {
        // Only method and target matter to the grammar.
        assert_eq!(parse("GET /ntp"), Command::TimeSync);
    }

    // -- Simple commands -----------------------------------------------------

    #[test]
    fn power_on_off() {
        assert_eq!(parse("GET /on HTTP/1.1"), Command::Power { on: true });
        assert_eq!(parse("GET /off HTTP/1.1"), Command::Power { on: false });
    }

    #[test]
    fn time_mode_switches() {
        assert_eq!(parse("GET /ntp HTTP/1.1"), Command::TimeSync);
        assert_eq!(parse("GET /manual HTTP/1.1"), Command::ManualTime);
    }

    #[test]
    fn relay_toggles_map_to_zero_based_indices() {
        assert_eq!(
            parse("GET /relay1/on HTTP/1.1"),
            Command::Relay { index: 0, on: true }
        );
        assert_eq!(
            parse("GET /relay4/off HTTP/1.1"),
            Command::Relay { index: 3, on: false }
        );
    }

    #[test]
    fn relay_index_out_of_grammar_is_unrecognized() {
        assert_eq!(parse("GET /relay5/on HTTP/1.1"), Command::Unrecognized);
        assert_eq!(parse("GET /relay0/on HTTP/1.1"), Command::Unrecognized);
        assert_eq!(parse("GET /relayX/on HTTP/1.1"), Command::Unrecognized);
    }

    // -- Login -----------------------------------------------------------------

    #[test]
    fn login_extracts_both_fields() {
        assert_eq!(
            parse("GET /login?user=admin&pass=1234 HTTP/1.1"),
            Command::Login {
                user: "admin".to_string(),
                pass: "1234".to_string()
            }
        );
    }

    #[test]
    fn login_missing_fields_become_empty() {
        assert_eq!(
            parse("GET /login?user=admin HTTP/1.1"),
            Command::Login {
                user: "admin".to_string(),
                pass: String::new()
            }
        );
    }

    // -- Modes --------------------------------------------------------------

    #[test]
    fn mode_command_with_known_token() {
        assert_eq!(
            parse("GET /relay2/mode/time HTTP/1.1"),
            Command::SetMode {
                index: 1,
                mode: RelayMode::Time
            }
        );
    }

    #[test]
    fn mode_command_unknown_token_widens_to_basic() {
        assert_eq!(
            parse("GET /relay2/mode/turbo HTTP/1.1"),
            Command::SetMode {
                index: 1,
                mode: RelayMode::Basic
            }
        );
    }

    // -- Time windows -------------------------------------------------------

    #[test]
    fn settime_parses_both_endpoints() {
        assert_eq!(
            parse("GET /settime?start=08:30&end=17:45 HTTP/1.1"),
            Command::SetGlobalWindow {
                start: Some((8, 30)),
                end: Some((17, 45)),
            }
        );
    }

    #[test]
    fn settime_missing_end_keeps_it_unset() {
        assert_eq!(
            parse("GET /settime?start=08:30 HTTP/1.1"),
            Command::SetGlobalWindow {
                start: Some((8, 30)),
                end: None,
            }
        );
    }

    #[test]
    fn settime_non_numeric_fields_parse_as_zero() {
        assert_eq!(
            parse("GET /settime?start=ab:cd&end=1x:30 HTTP/1.1"),
            Command::SetGlobalWindow {
                start: Some((0, 0)),
                end: Some((0, 30)),
            }
        );
    }

    #[test]
    fn settime_value_without_colon_is_hour_only() {
        assert_eq!(
            parse("GET /settime?start=9&end=17:00 HTTP/1.1"),
            Command::SetGlobalWindow {
                start: Some((9, 0)),
                end: Some((17, 0)),
            }
        );
    }

    #[test]
    fn per_relay_settime() {
        assert_eq!(
            parse("GET /relay1/settime?start=09:00&end=17:00 HTTP/1.1"),
            Command::SetRelayWindow {
                index: 0,
                start: Some((9, 0)),
                end: Some((17, 0)),
            }
        );
    }

    // -- API endpoint ------------------------------------------------------

    #[test]
    fn setapi_decodes_only_slash_and_colon() {
        assert_eq!(
            parse("GET /relay2/setapi?endpoint=http%3A%2F%2F10.0.0.5%2Fhook HTTP/1.1"),
            Command::SetApiEndpoint {
                index: 1,
                endpoint: Some("http://10.0.0.5/hook".to_string()),
            }
        );
    }

    #[test]
    fn setapi_leaves_other_escapes_alone() {
        assert_eq!(
            parse("GET /relay2/setapi?endpoint=a%20b%2Fc HTTP/1.1"),
            Command::SetApiEndpoint {
                index: 1,
                endpoint: Some("a%20b/c".to_string()),
            }
        );
    }

    #[test]
    fn setapi_without_endpoint_key() {
        assert_eq!(
            parse("GET /relay2/setapi? HTTP/1.1"),
            Command::SetApiEndpoint {
                index: 1,
                endpoint: None,
            }
        );
    }

    // -- Thresholds ------------------------------------------------------------

    #[test]
    fn settemp_reads_named_keys() {
        assert_eq!(
            parse("GET /relay3/settemp?tempMin=18.5&tempMax=26&humMin=40&humMax=60 HTTP/1.1"),
            Command::SetThresholds {
                index: 2,
                update: ThresholdUpdate {
                    temp_min: Some(18.5),
                    temp_max: Some(26.0),
                    hum_min: Some(40.0),
                    hum_max: Some(60.0),
                },
            }
        );
    }

    #[test]
    fn settemp_key_order_does_not_matter() {
        assert_eq!(
            parse("GET /relay3/settemp?humMax=60&tempMin=18.5 HTTP/1.1"),
            Command::SetThresholds {
                index: 2,
                update: ThresholdUpdate {
                    temp_min: Some(18.5),
                    hum_max: Some(60.0),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn settemp_unparseable_value_is_dropped() {
        assert_eq!(
            parse("GET /relay3/settemp?tempMin=warm&tempMax=26 HTTP/1.1"),
            Command::SetThresholds {
                index: 2,
                update: ThresholdUpdate {
                    temp_max: Some(26.0),
                    ..Default::default()
                },
            }
        );
    }

    // -- Network ---------------------------------------------------------------

    #[test]
    fn setnetwork_parses_dotted_quads() {
        assert_eq!(
            parse(
                "GET /setnetwork?ip=192.168.1.50&subnet=255.255.255.0&gateway=192.168.1.1&dns=8.8.8.8 HTTP/1.1"
            ),
            Command::SetNetwork {
                ip: Some(Ipv4Addr::new(192, 168, 1, 50)),
                subnet: Some(Ipv4Addr::new(255, 255, 255, 0)),
                gateway: Some(Ipv4Addr::new(192, 168, 1, 1)),
                dns: Some(Ipv4Addr::new(8, 8, 8, 8)),
            }
        );
    }

    #[test]
    fn setnetwork_bad_quad_is_dropped_not_fatal() {
        assert_eq!(
            parse("GET /setnetwork?ip=999.1.1.1&dns=8.8.4.4 HTTP/1.1"),
            Command::SetNetwork {
                ip: None,
                subnet: None,
                gateway: None,
                dns: Some(Ipv4Addr::new(8, 8, 4, 4)),
            }
        );
    }

    #[test]
    fn netconfig_is_acknowledged_shape() {
        assert_eq!(
            parse("GET /netconfig?ip=10.0.0.2&subnet=255.0.0.0 HTTP/1.1"),
            Command::NetConfig
        );
    }

    // -- Fallback ---------------------------------------------------------------

    #[test]
    fn unknown_paths_are_unrecognized() {
        assert_eq!(parse("GET / HTTP/1.1"), Command::Unrecognized);
        assert_eq!(parse("GET /logout HTTP/1.1"), Command::Unrecognized);
        assert_eq!(parse("GET /favicon.ico HTTP/1.1"), Command::Unrecognized);
        assert_eq!(parse("GET /relay1/blink HTTP/1.1"), Command::Unrecognized);
    }

    // -- Tokenizer details ---------------------------------------------------

    #[test]
    fn duplicate_keys_first_wins() {
        assert_eq!(
            parse("GET /login?user=a&user=b&pass=c HTTP/1.1"),
            Command::Login {
                user: "a".to_string(),
                pass: "c".to_string()
            }
        );
    }

    #[test]
    fn valueless_key_is_empty_string() {
        assert_eq!(
            parse("GET /login?user&pass=x HTTP/1.1"),
            Command::Login {
                user: String::new(),
                pass: "x".to_string()
            }
        );
    }
}
