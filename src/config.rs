use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::common::{DEFAULT_DESTINATION, DEFAULT_PORT};
use crate::mac::MacAddress;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/wol-send/config.yml";

/// Deserializes an absent field as None and an unset field as T::default. 
/// 
/// This avoid having Option<Option<T>> as in serde_with::rust::double_option
pub fn deserialize_absent_or_null<'de, D, T: Default>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.or(Some(T::default())))
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

#[derive(Debug, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            port: default_port(),
        }
    }
}

/// A named machine that can be woken by name instead of MAC.
#[derive(Debug, Clone, Deserialize)]
pub struct Host {
    pub mac: MacAddress,
    pub destination: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_absent_or_null")]
    pub defaults: Option<Defaults>,

    #[serde(default)]
    pub hosts: HashMap<String, Host>,
}

/// Expands `~` and environment variables the way a shell would.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

impl Config {
    pub fn from_yaml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str::<Option<Config>>(contents)
            .map(Option::unwrap_or_default)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Loads the file at `path`; a missing file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            },
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };

        let cfg = Self::from_yaml(path, &contents)?;
        log::debug!("loaded config from {} ({} hosts)", path.display(), cfg.hosts.len());
        Ok(cfg)
    }

    pub fn defaults(&self) -> &Defaults {
        static BUILTIN: std::sync::OnceLock<Defaults> = std::sync::OnceLock::new();
        self.defaults.as_ref().unwrap_or_else(|| BUILTIN.get_or_init(Defaults::default))
    }

    /// Exact name match first, then ASCII case-insensitive.
    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name).or_else(|| {
            self.hosts
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, h)| h)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        Config::from_yaml(Path::new("test.yml"), yaml).unwrap()
    }

    #[test]
    fn empty_file_is_default() {
        let cfg = parse("");
        assert!(cfg.hosts.is_empty());
        assert_eq!(cfg.defaults().destination, "192.168.1.255");
        assert_eq!(cfg.defaults().port, 9);
    }

    #[test]
    fn null_defaults_section() {
        let cfg = parse("defaults:\n");
        assert!(cfg.defaults.is_some());
        assert_eq!(cfg.defaults().port, 9);
    }

    #[test]
    fn hosts_and_defaults() {
        let cfg = parse(
            "defaults:\n  destination: 10.0.0.255\n  port: 7\n\
             hosts:\n  NAS:\n    mac: \"aa-bb-cc-dd-ee-ff\"\n    port: 9\n",
        );
        assert_eq!(cfg.defaults().destination, "10.0.0.255");
        assert_eq!(cfg.defaults().port, 7);

        let nas = cfg.host("nas").unwrap();
        assert_eq!(nas.mac, MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
        assert_eq!(nas.port, Some(9));
        assert!(nas.destination.is_none());
        assert!(cfg.host("desktop").is_none());
    }

    #[test]
    fn bad_mac_in_host_is_parse_error() {
        let res = Config::from_yaml(Path::new("x.yml"), "hosts:\n  pc:\n    mac: nope\n");
        assert!(matches!(res, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("wol-send-missing-config-does-not-exist.yml");
        let cfg = Config::load(&path).unwrap();
        assert!(cfg.hosts.is_empty());
    }

    #[test]
    fn absolute_path_unchanged() {
        let expanded = expand_path("/etc/wol-send.yml");
        assert_eq!(expanded, PathBuf::from("/etc/wol-send.yml"));
    }
}
