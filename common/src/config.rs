//! Configuration parsing – reads an optional `KEY=VALUE` file and lets the
//! process environment override it.
//!
//! Recognised keys:
//!   PORT        listen port (default 3000)
//!   HOST        listen host (default 0.0.0.0)
//!   STATIC_DIR  directory holding `index.html` and the `/static` assets

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Config {
    /// Address string suitable for `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The HTML template served for the root path.
    pub fn template_path(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}

/// Load configuration: the file at `path` (if given), then environment
/// overrides.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut map = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read config: {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            parse_conf(&text)
        }
        None => HashMap::new(),
    };

    for key in ["PORT", "HOST", "STATIC_DIR"] {
        if let Ok(val) = std::env::var(key) {
            map.insert(key.to_string(), val);
        }
    }

    Ok(from_map(&map))
}

/// Build a config from parsed keys. Unknown keys are ignored; an
/// unparseable port falls back to the default.
fn from_map(map: &HashMap<String, String>) -> Config {
    let get = |key: &str| -> Option<String> {
        map.get(key).cloned().filter(|v| !v.is_empty())
    };
    let defaults = Config::default();

    let port = match get("PORT") {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid PORT {raw:?}, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        None => defaults.port,
    };

    Config {
        host: get("HOST").unwrap_or(defaults.host),
        port,
        static_dir: get("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir),
    }
}

/// Parse `KEY=VALUE` lines into a map, stripping optional double-quotes.
fn parse_conf(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, val)) = line.split_once('=') {
            let key = key.trim();
            let val = val.trim().trim_matches('"');
            map.insert(key.to_string(), val.to_string());
        }
    }
    map
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conf() {
        let text = r#"
# comment
PORT=8080
HOST="127.0.0.1"
STATIC_DIR = /srv/probe/static
"#;
        let map = parse_conf(text);
        assert_eq!(map["PORT"], "8080");
        assert_eq!(map["HOST"], "127.0.0.1");
        assert_eq!(map["STATIC_DIR"], "/srv/probe/static");
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&HashMap::new());
        assert_eq!(config, Config::default());
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.template_path(), PathBuf::from("static/index.html"));
    }

    #[test]
    fn test_bad_port_falls_back() {
        let map = parse_conf("PORT=not-a-number\n");
        assert_eq!(from_map(&map).port, DEFAULT_PORT);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.conf");
        std::fs::write(&path, "STATIC_DIR=/tmp/assets\n").unwrap();
        let config = load(Some(&path)).unwrap();
        // The environment wins over the file when set.
        if std::env::var("STATIC_DIR").is_err() {
            assert_eq!(config.static_dir, PathBuf::from("/tmp/assets"));
        }
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(load(Some(Path::new("/nonexistent/probe.conf"))).is_err());
    }
}
