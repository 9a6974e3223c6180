//! Configuration loaded from the environment.

use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SCAN_INTERVAL_SECS: u64 = 2;
const DEFAULT_EVENT_BUFFER: usize = 128;
// The broadcast ring is allocated up front at this size
const MAX_EVENT_BUFFER: u64 = 65_536;

#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Root of the watched tree, made absolute
    pub watch_dir: PathBuf,
    /// Pause between two scans
    pub scan_interval: Duration,
    /// Per-subscriber queue capacity before the oldest events are dropped
    pub event_buffer: usize,
}

impl WatchConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let watch_dir =
            PathBuf::from(lookup("WATCH_DIR").unwrap_or_else(|| String::from("./watched")));
        let watch_dir =
            std::path::absolute(&watch_dir).map_err(|source| ConfigError::WatchDir {
                path: watch_dir.clone(),
                source,
            })?;

        let interval_secs = parse_bounded(
            &lookup,
            "SCAN_INTERVAL_SECS",
            DEFAULT_SCAN_INTERVAL_SECS,
            u64::MAX,
        )?;
        let event_buffer = parse_bounded(
            &lookup,
            "EVENT_BUFFER",
            DEFAULT_EVENT_BUFFER as u64,
            MAX_EVENT_BUFFER,
        )?;

        Ok(Self {
            addr: lookup("ADDR").unwrap_or_else(|| String::from("127.0.0.1")),
            port: lookup("PORT").unwrap_or_else(|| String::from("8080")),
            watch_dir,
            scan_interval: Duration::from_secs(interval_secs),
            event_buffer: event_buffer as usize,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

/// Parse `var` as an integer in `1..=max`, or fall back to `default` when unset.
fn parse_bounded<F>(
    lookup: &F,
    var: &'static str,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 && n <= max => Ok(n),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WatchConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.addr, "127.0.0.1");
        assert_eq!(config.port, "8080");
        assert_eq!(config.scan_interval, Duration::from_secs(2));
        assert_eq!(config.event_buffer, 128);
        assert!(config.watch_dir.is_absolute());
        assert!(config.watch_dir.ends_with("watched"));
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_overrides() {
        let config = WatchConfig::from_lookup(lookup_from(&[
            ("ADDR", "0.0.0.0"),
            ("PORT", "9000"),
            ("WATCH_DIR", "/srv/data"),
            ("SCAN_INTERVAL_SECS", "5"),
            ("EVENT_BUFFER", "16"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.watch_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.scan_interval, Duration::from_secs(5));
        assert_eq!(config.event_buffer, 16);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = WatchConfig::from_lookup(lookup_from(&[("SCAN_INTERVAL_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "SCAN_INTERVAL_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_garbage_buffer() {
        let err =
            WatchConfig::from_lookup(lookup_from(&[("EVENT_BUFFER", "lots")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "EVENT_BUFFER",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_oversized_buffer() {
        let err = WatchConfig::from_lookup(lookup_from(&[(
            "EVENT_BUFFER",
            "18446744073709551615",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "EVENT_BUFFER",
                ..
            }
        ));

        let config = WatchConfig::from_lookup(lookup_from(&[("EVENT_BUFFER", "65536")])).unwrap();
        assert_eq!(config.event_buffer, 65_536);
    }
}
