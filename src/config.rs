use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// | Env Var      | Default          |
/// |--------------|------------------|
/// | `HOST`       | `127.0.0.1`      |
/// | `PORT`       | `8080`           |
/// | `STORE_PATH` | `timetable.json` |
/// | `LOG_LEVEL`  | `info`           |
///
/// `RUST_LOG` still takes precedence over `LOG_LEVEL` when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store_path: PathBuf,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            store_path: PathBuf::from("timetable.json"),
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a port number",
                value: raw.clone(),
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            store_path: lookup("STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            name: "HOST",
            expected: "an IP address",
            value: self.host.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
            ("STORE_PATH", "/var/lib/rooms.json"),
            ("LOG_LEVEL", "trace"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.store_path, PathBuf::from("/var/lib/rooms.json"));
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn rejects_bad_port_and_host() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let config = ServerConfig::from_lookup(lookup(&[("HOST", "not a host")])).unwrap();
        assert!(matches!(
            config.bind_addr(),
            Err(ConfigError::Invalid { name: "HOST", .. })
        ));
    }
}
