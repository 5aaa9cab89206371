use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::common::{DEFAULT_DESTINATION, DEFAULT_PORT};

pub const DEFAULT_STATE_PATH: &str = "~/.local/state/wol-send/last.yml";

/// Values of the last wake request, used to prefill the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastUsed {
    #[serde(default)]
    pub mac: String,
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

impl Default for LastUsed {
    fn default() -> Self {
        Self {
            mac: String::new(),
            destination: default_destination(),
            port: default_port(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("could not access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not (de)serialize {path}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

/// Keyed storage for the last used values. Never consulted by the sender itself.
pub trait LastUsedStore {
    fn load(&self) -> Result<LastUsed, StoreError>;
    fn save(&self, values: &LastUsed) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Option<LastUsed>>,
}

impl LastUsedStore for MemoryStore {
    fn load(&self) -> Result<LastUsed, StoreError> {
        let guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, values: &LastUsed) -> Result<(), StoreError> {
        let mut guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(values.clone());
        Ok(())
    }
}

/// Stores the values as a small YAML document.
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    path: PathBuf,
}

impl YamlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io { path: self.path.clone(), source }
    }

    fn format_err(&self) -> impl FnOnce(serde_yml::Error) -> StoreError + '_ {
        move |source| StoreError::Format { path: self.path.clone(), source }
    }
}

impl LastUsedStore for YamlFileStore {
    fn load(&self) -> Result<LastUsed, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::trace!("no stored values at {}", self.path.display());
                return Ok(LastUsed::default());
            },
            Err(e) => return Err(self.io_err()(e)),
        };

        if contents.trim().is_empty() {
            return Ok(LastUsed::default());
        }
        serde_yml::from_str(&contents).map_err(self.format_err())
    }

    fn save(&self, values: &LastUsed) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(self.io_err())?;
        }

        let yaml = serde_yml::to_string(values).map_err(self.format_err())?;
        std::fs::write(&self.path, yaml).map_err(self.io_err())?;
        log::debug!("saved last used values to {}", self.path.display());
        Ok(())
    }
}
