//! Environment-driven process configuration. A `.env` file is loaded
//! when present; explicit environment always wins.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("environment variable {0} must be set for the selected store backend")]
    Missing(&'static str),
}

/// Which job store implementation the process runs against.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres {
        database_url: String,
    },
}

/// Which source fetcher feeds the probe.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FetcherKind {
    #[default]
    Http,
    File {
        root: Option<PathBuf>,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Worker wait between empty-queue checks.
    pub poll_interval: Duration,
    /// Path to the external probe binary.
    pub probe_binary: String,
    pub store: StoreBackend,
    pub fetcher: FetcherKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            probe_binary: probex_core::probe::DEFAULT_PROBE_BINARY.to_string(),
            store: StoreBackend::default(),
            fetcher: FetcherKind::default(),
        }
    }
}

impl Config {
    /// Load from the process environment, after a best-effort `.env`
    /// load.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("SERVER_ADDR")
            && !host.trim().is_empty()
        {
            config.host = host;
        }

        if let Some(port) = lookup("SERVER_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid {
                name: "SERVER_PORT",
                reason: format!("not a port number: {port}"),
            })?;
        }

        if let Some(secs) = lookup("NO_JOB_WAIT_TIME") {
            let secs: u64 = secs.parse().map_err(|_| ConfigError::Invalid {
                name: "NO_JOB_WAIT_TIME",
                reason: format!("not a number of seconds: {secs}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "NO_JOB_WAIT_TIME",
                    reason: "must be at least 1 second".to_string(),
                });
            }
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(binary) = lookup("FFPROBE_PATH")
            && !binary.trim().is_empty()
        {
            config.probe_binary = binary;
        }

        config.store = match lookup("JOB_STORE").as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("postgres") => {
                let database_url = lookup("DATABASE_URL")
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?;
                StoreBackend::Postgres { database_url }
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "JOB_STORE",
                    reason: format!("expected memory or postgres, got {other}"),
                });
            }
        };

        config.fetcher = match lookup("SOURCE_FETCHER").as_deref() {
            None | Some("http") => FetcherKind::Http,
            Some("file") => FetcherKind::File {
                root: lookup("MEDIA_ROOT")
                    .filter(|root| !root.trim().is_empty())
                    .map(PathBuf::from),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "SOURCE_FETCHER",
                    reason: format!("expected http or file, got {other}"),
                });
            }
        };

        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.probe_binary, "ffprobe");
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.fetcher, FetcherKind::Http);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1"),
            ("SERVER_PORT", "9090"),
            ("NO_JOB_WAIT_TIME", "3"),
            ("FFPROBE_PATH", "/opt/ffmpeg/bin/ffprobe"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:9090");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.probe_binary, "/opt/ffmpeg/bin/ffprobe");
    }

    #[test]
    fn bad_port_and_wait_time_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("SERVER_PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("NO_JOB_WAIT_TIME", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("NO_JOB_WAIT_TIME", "soon")])).is_err());
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = Config::from_lookup(lookup(&[("JOB_STORE", "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));

        let config = Config::from_lookup(lookup(&[
            ("JOB_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/probex"),
        ]))
        .unwrap();
        assert!(matches!(config.store, StoreBackend::Postgres { .. }));
    }

    #[test]
    fn unknown_backend_names_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("JOB_STORE", "redis")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SOURCE_FETCHER", "ftp")])).is_err());
    }

    #[test]
    fn file_fetcher_picks_up_media_root() {
        let config = Config::from_lookup(lookup(&[
            ("SOURCE_FETCHER", "file"),
            ("MEDIA_ROOT", "/srv/media"),
        ]))
        .unwrap();
        assert_eq!(
            config.fetcher,
            FetcherKind::File {
                root: Some(PathBuf::from("/srv/media")),
            }
        );
    }
}
