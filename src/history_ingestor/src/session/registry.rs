//! Named connection profiles, one per mode.
//!
//! A mode selects which terminal endpoint and which account the session logs in
//! with. The set of modes is fixed when the registry is built (usually from
//! configuration); lookups of anything else fail with
//! [`IngestError::UnknownMode`] rather than falling back to a default.

use std::path::PathBuf;

use indexmap::IndexMap;
use secrecy::SecretString;

use crate::errors::IngestError;

/// Endpoint and credentials for one mode. Immutable once registered.
///
/// `Debug` output never contains the password.
#[derive(Debug)]
pub struct ConnectionProfile {
    /// Normalized mode name this profile is registered under.
    pub mode: String,
    /// Trade server name, e.g. `"Broker-Demo"`.
    pub server: String,
    pub login: u64,
    pub password: SecretString,
    /// Terminal installation to launch, when the bridge needs one.
    pub terminal_path: Option<PathBuf>,
}

/// Trims and lowercases a mode name.
pub fn normalize_mode(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Mode name -> profile, in declaration order.
#[derive(Debug, Default)]
pub struct ModeRegistry {
    profiles: IndexMap<String, ConnectionProfile>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `profile` under its normalized mode name.
    ///
    /// Returns the rejected profile if the name is empty or already taken.
    pub fn register(&mut self, mut profile: ConnectionProfile) -> Result<(), ConnectionProfile> {
        let key = normalize_mode(&profile.mode);
        if key.is_empty() || self.profiles.contains_key(&key) {
            return Err(profile);
        }
        profile.mode = key.clone();
        self.profiles.insert(key, profile);
        Ok(())
    }

    /// Looks up a profile; `name` is normalized first.
    pub fn get(&self, name: &str) -> Result<&ConnectionProfile, IngestError> {
        self.profiles
            .get(&normalize_mode(name))
            .ok_or_else(|| IngestError::UnknownMode {
                mode: name.to_string(),
                known: self.modes().map(str::to_string).collect(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(&normalize_mode(name))
    }

    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
