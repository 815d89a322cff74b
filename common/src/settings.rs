//! Client-side settings, taken from the query string of the page request
//! (e.g. `/?cap=3&debug=1`).

use tracing::warn;

use crate::log::DEFAULT_LOG_CAP;
use crate::request::RequestRecord;

/// Upper bound accepted for `cap`.
pub const MAX_LOG_CAP: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub log_cap: usize,
    /// Enables message shape introspection.
    pub debug: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            log_cap: DEFAULT_LOG_CAP,
            debug: false,
        }
    }
}

impl ClientSettings {
    pub fn from_request(record: &RequestRecord) -> Self {
        let query = record.query();
        let defaults = Self::default();

        let log_cap = match query.get("cap") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if (1..=MAX_LOG_CAP).contains(&n) => n,
                _ => {
                    warn!("ignoring log cap {raw:?}");
                    defaults.log_cap
                }
            },
            None => defaults.log_cap,
        };

        let debug = query
            .get("debug")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.debug);

        ClientSettings { log_cap, debug }
    }
}
