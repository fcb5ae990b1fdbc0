use std::fmt;
use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::duid::Duid;
use crate::error::Dhcp6Error;
use crate::request::{is_valid_domain_name, IaRequest, Request};

/// Process-wide configuration, analogous to the server's `Config`: loaded
/// once at startup and held behind an `ArcSwap` so it can be hot-reloaded
/// without restarting any in-flight exchange.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub default_duid_hex: Option<String>,
    pub user_class: Vec<String>,
    pub vendor_class: Option<(u32, String)>,
    pub vendor_opts: Vec<(u16, Vec<u8>)>,
    /// Servers whose Advertise is ignored outright (`spec.md` §4.7,
    /// `SPEC_FULL.md` §9 Open Question 3: compared as parsed `Ipv6Addr`,
    /// not as formatted strings, so `::1` and `0:0:0:0:0:0:0:1` match).
    pub ignore_servers: Vec<Ipv6Addr>,
    /// Preferred servers and the weight bonus added to their Advertise
    /// preference when picking the best offer.
    pub preferred_servers: Vec<(Ipv6Addr, i32)>,
    pub max_lease_time: Option<u32>,
    pub log_level: tracing::Level,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            default_duid_hex: None,
            user_class: vec![],
            vendor_class: None,
            vendor_opts: vec![],
            ignore_servers: vec![],
            preferred_servers: vec![],
            max_lease_time: None,
            log_level: tracing::Level::INFO,
        }
    }
}

impl ClientConfig {
    pub fn is_ignored_server(&self, addr: Ipv6Addr) -> bool {
        self.ignore_servers.iter().any(|s| *s == addr)
    }

    pub fn preference_bonus(&self, addr: Ipv6Addr) -> i32 {
        self.preferred_servers
            .iter()
            .find(|(s, _)| *s == addr)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }
}

/// On-disk shape of `ClientConfig`, deserialized before being turned into
/// the typed form above.
#[derive(Deserialize)]
struct RawClientConfig {
    default_duid: Option<String>,
    #[serde(default)]
    user_class: Vec<String>,
    vendor_class_enterprise: Option<u32>,
    vendor_class_data: Option<String>,
    #[serde(default)]
    ignore_servers: Vec<Ipv6Addr>,
    #[serde(default)]
    preferred_servers: Vec<(Ipv6Addr, i32)>,
    max_lease_time: Option<u32>,
    log_level: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Parsing { err: serde_json::Error, path: PathBuf },
    Io { err: std::io::Error, path: PathBuf },
    LogLevel(String),
}

trait PathContext<T> {
    fn context<P: AsRef<Path>>(self, path: P) -> Result<T, ConfigError>;
}

impl<T> PathContext<T> for serde_json::Result<T> {
    fn context<P: AsRef<Path>>(self, path: P) -> Result<T, ConfigError> {
        self.map_err(|e| ConfigError::Parsing {
            err: e,
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl<T> PathContext<T> for std::io::Result<T> {
    fn context<P: AsRef<Path>>(self, path: P) -> Result<T, ConfigError> {
        self.map_err(|e| ConfigError::Io {
            err: e,
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parsing { err, path } => {
                write!(f, "parsing `{}`: {err}", path.to_string_lossy())
            }
            ConfigError::Io { err, path } => write!(f, "`{}`: {err}", path.to_string_lossy()),
            ConfigError::LogLevel(value) => write!(
                f,
                r#"unexpected log level {value}, expected one of [trace, debug, info, warn, error]"#
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ClientConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
        let raw: RawClientConfig =
            serde_json::from_reader(std::fs::File::open(&path).context(&path)?).context(&path)?;

        let log_level = match raw.log_level {
            Some(s) if !s.is_empty() => {
                use std::str::FromStr;
                tracing::Level::from_str(&s).map_err(|_| ConfigError::LogLevel(s))?
            }
            _ => tracing::Level::INFO,
        };

        let vendor_class = match (raw.vendor_class_enterprise, raw.vendor_class_data) {
            (Some(enterprise), Some(data)) => Some((enterprise, data)),
            _ => None,
        };

        Ok(ClientConfig {
            default_duid_hex: raw.default_duid,
            user_class: raw.user_class,
            vendor_class,
            vendor_opts: vec![],
            ignore_servers: raw.ignore_servers,
            preferred_servers: raw.preferred_servers,
            max_lease_time: raw.max_lease_time,
            log_level,
        })
    }
}

/// Per-device configuration, resolved once at `acquire` time from the
/// incoming `Request` plus the derived DUID and IAID (`spec.md` §3
/// "Configuration object").
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub uuid: compact_str::CompactString,
    pub update: u32,
    pub info_only: bool,
    pub rapid_commit: bool,
    pub lease_time: Option<u32>,
    pub client_duid: Duid,
    pub iaid: u32,
    pub ia_list: Vec<IaRequest>,
    pub hostname: Option<compact_str::CompactString>,
    pub user_class: Vec<compact_str::CompactString>,
    pub vendor_class: Option<(u32, compact_str::CompactString)>,
}

impl DeviceConfig {
    pub fn from_request(request: &Request, client_duid: Duid, iaid: u32) -> Self {
        let hostname = request.hostname.as_ref().and_then(|h| {
            if is_valid_domain_name(h) {
                Some(h.clone())
            } else {
                let err = Dhcp6Error::MalformedRequest("hostname failed domain-name validation".into());
                warn!(hostname_len = h.len(), %err, "dropping requested hostname");
                None
            }
        });

        DeviceConfig {
            uuid: request.uuid.clone(),
            update: request.update,
            info_only: request.info_only,
            rapid_commit: request.rapid_commit,
            lease_time: None,
            client_duid,
            iaid,
            ia_list: request.ia_list.clone(),
            hostname,
            user_class: request.user_class.clone(),
            vendor_class: request.vendor_class.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_and_preference_lookup() {
        let mut cfg = ClientConfig::default();
        let addr: Ipv6Addr = "2001:db8::1".parse().unwrap();
        cfg.ignore_servers.push(addr);
        assert!(cfg.is_ignored_server(addr));
        assert!(!cfg.is_ignored_server("2001:db8::2".parse().unwrap()));

        cfg.preferred_servers.push((addr, 5));
        assert_eq!(cfg.preference_bonus(addr), 5);
        assert_eq!(cfg.preference_bonus("2001:db8::2".parse().unwrap()), 0);
    }

    #[test]
    fn device_config_carries_request_fields() {
        let request = Request {
            hostname: Some("host1".into()),
            ..Request::default()
        };
        let duid = Duid::from(vec![1, 2, 3]);
        let cfg = DeviceConfig::from_request(&request, duid.clone(), 7);
        assert_eq!(cfg.iaid, 7);
        assert_eq!(cfg.client_duid, duid);
        assert_eq!(cfg.hostname.as_deref(), Some("host1"));
    }

    #[test]
    fn invalid_hostname_is_dropped() {
        let request = Request {
            hostname: Some("-not a hostname-".into()),
            ..Request::default()
        };
        let cfg = DeviceConfig::from_request(&request, Duid::from(vec![1]), 1);
        assert!(cfg.hostname.is_none());
    }
}
