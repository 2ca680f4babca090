//! Ingestor configuration: parsing, normalization, and loading.
//!
//! The configuration is a TOML document describing:
//! - the connection profile of every mode (`[modes.<name>]`)
//! - which mode is active when the client starts (`default_mode`)
//! - chunking and failure policy for range fetches (`[fetch]`)
//! - where the terminal bridge listens (`[bridge]`)
//!
//! ```toml
//! default_mode = "forex"
//!
//! [fetch]
//! max_units_per_chunk = 70000
//! chunk_timeout_secs = 30
//! empty_chunks = "fail"
//! max_range_days = 30
//!
//! [bridge]
//! base_url = "http://127.0.0.1:8222"
//!
//! [modes.forex]
//! server = "Broker-Demo"
//! login = 5012345
//! password = "env:FOREX_PASSWORD"
//!
//! [modes.synthetic]
//! server = "Broker-Synthetic"
//! login = 7012345
//! password = "env:SYNTHETIC_PASSWORD"
//! terminal_path = "C:/Program Files/Terminal64/terminal64.exe"
//! ```
//!
//! Normalization trims and lowercases mode names, rejects empty names and names
//! that collide after normalization, and checks that `default_mode` names a
//! declared mode. Passwords of the form `env:VAR` are read from the environment
//! at load time.
//!
//! Entrypoints: [`load_config_str`] and [`load_config_path`].

use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use shared_utils::env::{MissingEnvVarError, resolve_env_ref};
use thiserror::Error;

use crate::{
    partition::DEFAULT_MAX_UNITS_PER_CHUNK,
    session::registry::{ConnectionProfile, ModeRegistry, normalize_mode},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("mode name is empty after normalization")]
    EmptyModeName,

    #[error("duplicate mode after normalization: {0}")]
    DuplicateMode(String),

    #[error("default_mode {mode:?} is not a declared mode; declared: {known:?}")]
    UnknownDefaultMode { mode: String, known: Vec<String> },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("password for mode {mode:?} could not be resolved: {source}")]
    Secret {
        mode: String,
        source: MissingEnvVarError,
    },
}

/// What to do when the terminal answers a chunk with no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyChunkPolicy {
    /// Treat the chunk as failed and abort the whole fetch.
    #[default]
    Fail,
    /// Accept the chunk as contributing no rows.
    Skip,
}

/// Chunking and failure policy applied to every range fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub max_units_per_chunk: NonZeroU32,
    /// Deadline for one chunk request. `None` waits as long as the source does.
    pub chunk_timeout: Option<Duration>,
    pub empty_chunks: EmptyChunkPolicy,
    /// Longest range the chunked operations accept, in days.
    pub max_range_days: Option<NonZeroU32>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_units_per_chunk: DEFAULT_MAX_UNITS_PER_CHUNK,
            chunk_timeout: None,
            empty_chunks: EmptyChunkPolicy::Fail,
            max_range_days: None,
        }
    }
}

/// Location of the terminal bridge process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub base_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl BridgeConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Fully loaded and normalized configuration.
#[derive(Debug)]
pub struct IngestorConfig {
    /// Normalized name of the mode to activate at startup.
    pub default_mode: Option<String>,
    pub fetch: FetchSettings,
    pub bridge: Option<BridgeConfig>,
    pub registry: ModeRegistry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    default_mode: Option<String>,
    #[serde(default)]
    fetch: RawFetch,
    bridge: Option<BridgeConfig>,
    #[serde(default)]
    modes: IndexMap<String, RawMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFetch {
    max_units_per_chunk: Option<u32>,
    chunk_timeout_secs: Option<u64>,
    #[serde(default)]
    empty_chunks: EmptyChunkPolicy,
    max_range_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMode {
    server: String,
    login: u64,
    password: String,
    terminal_path: Option<PathBuf>,
}

impl RawFetch {
    fn into_settings(self) -> Result<FetchSettings, ConfigError> {
        let max_units_per_chunk = match self.max_units_per_chunk {
            Some(n) => NonZeroU32::new(n).ok_or(ConfigError::Zero {
                field: "fetch.max_units_per_chunk",
            })?,
            None => DEFAULT_MAX_UNITS_PER_CHUNK,
        };
        let chunk_timeout = match self.chunk_timeout_secs {
            Some(0) => {
                return Err(ConfigError::Zero {
                    field: "fetch.chunk_timeout_secs",
                });
            }
            other => other.map(Duration::from_secs),
        };
        let max_range_days = match self.max_range_days {
            Some(n) => Some(NonZeroU32::new(n).ok_or(ConfigError::Zero {
                field: "fetch.max_range_days",
            })?),
            None => None,
        };
        Ok(FetchSettings {
            max_units_per_chunk,
            chunk_timeout,
            empty_chunks: self.empty_chunks,
            max_range_days,
        })
    }
}

fn build_registry(modes: IndexMap<String, RawMode>) -> Result<ModeRegistry, ConfigError> {
    let mut registry = ModeRegistry::new();
    for (name, raw) in modes {
        let mode = normalize_mode(&name);
        if mode.is_empty() {
            return Err(ConfigError::EmptyModeName);
        }
        if registry.contains(&mode) {
            return Err(ConfigError::DuplicateMode(mode));
        }
        let password = resolve_env_ref(raw.password.trim()).map_err(|source| ConfigError::Secret {
            mode: mode.clone(),
            source,
        })?;
        let profile = ConnectionProfile {
            mode: mode.clone(),
            server: raw.server.trim().to_string(),
            login: raw.login,
            password: SecretString::new(password.into()),
            terminal_path: raw.terminal_path,
        };
        registry
            .register(profile)
            .map_err(|_| ConfigError::DuplicateMode(mode))?;
    }
    Ok(registry)
}

/// Parse and normalize a configuration from a TOML string.
pub fn load_config_str(s: &str) -> Result<IngestorConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(s)?;

    let fetch = raw.fetch.into_settings()?;
    let registry = build_registry(raw.modes)?;

    let default_mode = match raw.default_mode {
        Some(name) => {
            let mode = normalize_mode(&name);
            if !registry.contains(&mode) {
                return Err(ConfigError::UnknownDefaultMode {
                    mode: name,
                    known: registry.modes().map(str::to_string).collect(),
                });
            }
            Some(mode)
        }
        None => None,
    };

    Ok(IngestorConfig {
        default_mode,
        fetch,
        bridge: raw.bridge,
        registry,
    })
}

/// Parse and normalize a configuration from a TOML file.
pub fn load_config_path<P: AsRef<Path>>(path: P) -> Result<IngestorConfig, ConfigError> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_str(&s)
}
