//! Module: config
//! Responsibility: parse driver URLs into an explicit connection configuration.
//! Does not own: driver registration or connection lifecycle.

use crate::driver::DriverError;
use std::fmt;

/// URL prefixes the driver accepts, longest first.
pub const URL_PREFIXES: [&str; 2] = ["jdbc:glacier://", "glacier://"];

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9200;

const TIMEZONE: &str = "timezone";
const CONNECT_TIMEOUT: &str = "connect.timeout";
const QUERY_TIMEOUT: &str = "query.timeout";
const PAGE_SIZE: &str = "page.size";
const DEBUG: &str = "debug";

///
/// PropertyInfo
///
/// One recognised configuration key with its effective value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub value: String,
    pub description: &'static str,
}

///
/// DriverConfig
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DriverConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub timezone: String,
    pub connect_timeout_ms: u64,
    pub query_timeout_ms: u64,
    pub page_size: u32,
    pub debug: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: String::new(),
            timezone: "UTC".to_string(),
            connect_timeout_ms: 30_000,
            query_timeout_ms: 90_000,
            page_size: 1000,
            debug: false,
        }
    }
}

impl DriverConfig {
    #[must_use]
    pub fn accepts_url(url: &str) -> bool {
        strip_prefix(url).is_some()
    }

    /// Parse `[jdbc:]glacier://host[:port][/path][?key=value&...]`.
    pub fn from_url(url: &str) -> Result<Self, DriverError> {
        let rest = strip_prefix(url).ok_or_else(|| DriverError::UnsupportedUrl {
            url: url.to_string(),
        })?;

        let (location, query) = rest.split_once('?').unwrap_or((rest, ""));
        let (authority, path) = location.split_once('/').unwrap_or((location, ""));

        let mut config = Self {
            path: path.to_string(),
            ..Self::default()
        };
        config.set_authority(authority)?;

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            config.set(key, value)?;
        }

        Ok(config)
    }

    /// Apply one property by key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), DriverError> {
        match key {
            TIMEZONE => {
                if value.is_empty() {
                    return Err(invalid(key, value));
                }
                self.timezone = value.to_string();
            }
            CONNECT_TIMEOUT => self.connect_timeout_ms = parse(key, value)?,
            QUERY_TIMEOUT => self.query_timeout_ms = parse(key, value)?,
            PAGE_SIZE => match parse(key, value)? {
                0 => return Err(invalid(key, value)),
                size => self.page_size = size,
            },
            DEBUG => self.debug = parse(key, value)?,
            _ => {
                return Err(DriverError::UnknownProperty {
                    key: key.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Every recognised key with its current value.
    #[must_use]
    pub fn property_info(&self) -> Vec<PropertyInfo> {
        vec![
            PropertyInfo {
                name: TIMEZONE,
                value: self.timezone.clone(),
                description: "time zone applied to date values",
            },
            PropertyInfo {
                name: CONNECT_TIMEOUT,
                value: self.connect_timeout_ms.to_string(),
                description: "connection timeout in milliseconds",
            },
            PropertyInfo {
                name: QUERY_TIMEOUT,
                value: self.query_timeout_ms.to_string(),
                description: "query timeout in milliseconds",
            },
            PropertyInfo {
                name: PAGE_SIZE,
                value: self.page_size.to_string(),
                description: "rows fetched per page",
            },
            PropertyInfo {
                name: DEBUG,
                value: self.debug.to_string(),
                description: "trace driver calls",
            },
        ]
    }

    fn set_authority(&mut self, authority: &str) -> Result<(), DriverError> {
        if authority.is_empty() {
            return Ok(());
        }

        // bracketed IPv6 literals carry colons of their own
        let (host, port) = match authority.strip_prefix('[') {
            Some(bracketed) => {
                let (host, tail) = bracketed
                    .split_once(']')
                    .ok_or_else(|| invalid("host", authority))?;
                (host, tail.strip_prefix(':'))
            }
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };

        if !host.is_empty() {
            self.host = host.to_string();
        }
        if let Some(port) = port {
            self.port = parse("port", port)?;
        }

        Ok(())
    }
}

impl fmt::Display for DriverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "glacier://{}:{}/{}", self.host, self.port, self.path)
    }
}

fn strip_prefix(url: &str) -> Option<&str> {
    URL_PREFIXES
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DriverError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> DriverError {
    DriverError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_url_uses_defaults() {
        let config = DriverConfig::from_url("jdbc:glacier://").expect("bare url parses");

        assert_eq!(config, DriverConfig::default());
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9200);
    }

    #[test]
    fn host_port_path_and_properties_are_parsed() {
        let config = DriverConfig::from_url(
            "glacier://db.local:9300/cluster?timezone=Europe/Paris&page.size=50&debug=true",
        )
        .expect("url parses");

        assert_eq!(config.host, "db.local");
        assert_eq!(config.port, 9300);
        assert_eq!(config.path, "cluster");
        assert_eq!(config.timezone, "Europe/Paris");
        assert_eq!(config.page_size, 50);
        assert!(config.debug);
    }

    #[test]
    fn ipv6_hosts_keep_their_colons() {
        let config = DriverConfig::from_url("jdbc:glacier://[::1]:9201").expect("url parses");

        assert_eq!(config.host, "::1");
        assert_eq!(config.port, 9201);
    }

    #[test]
    fn unknown_properties_are_rejected() {
        assert_eq!(
            DriverConfig::from_url("glacier://h?colour=blue"),
            Err(DriverError::UnknownProperty {
                key: "colour".to_string()
            })
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_eq!(
            DriverConfig::from_url("glacier://h?connect.timeout=soon"),
            Err(DriverError::InvalidProperty {
                key: "connect.timeout".to_string(),
                value: "soon".to_string()
            })
        );
        assert!(DriverConfig::from_url("glacier://h:port").is_err());
        assert!(DriverConfig::from_url("glacier://h?page.size=0").is_err());
    }

    #[test]
    fn foreign_urls_are_not_accepted() {
        assert!(!DriverConfig::accepts_url("jdbc:mysql://h"));
        assert!(DriverConfig::from_url("jdbc:mysql://h").is_err());
    }

    #[test]
    fn property_info_lists_effective_values() {
        let config = DriverConfig::from_url("glacier://h?query.timeout=5").expect("url parses");
        let info = config.property_info();

        assert_eq!(info.len(), 5);
        assert!(
            info.iter()
                .any(|p| p.name == "query.timeout" && p.value == "5")
        );
    }
}
