//! The live terminal session and the mode it is logged in under.
//!
//! [`Session`] owns the [`TerminalSource`], the [`ModeRegistry`] and the
//! connection state. The UTC offset reported by the terminal is cached inside
//! the connected state, so dropping back to disconnected forgets it. Switching
//! mode always goes through a disconnect, which means no request can reach the
//! terminal under one mode's credentials while the offset of another is cached.
//!
//! Connecting is lazy: [`Session::set_mode`] only records the choice and the
//! handshake happens in [`Session::ensure_connected`], the first time an
//! operation actually needs the terminal.

pub mod registry;
pub mod tz;

use tracing::{info, warn};

use crate::{
    config::FetchSettings,
    errors::IngestError,
    fetch::SeriesFetcher,
    source::{Diagnostic, TerminalSource},
};

use self::{registry::ModeRegistry, tz::TimezoneResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Connectivity {
    Disconnected,
    Connected { mode: String, tz: TimezoneResolver },
}

pub struct Session<S> {
    source: S,
    registry: ModeRegistry,
    active_mode: Option<String>,
    state: Connectivity,
}

impl<S: TerminalSource> Session<S> {
    /// A disconnected session with no mode selected.
    pub fn new(source: S, registry: ModeRegistry) -> Self {
        Self {
            source,
            registry,
            active_mode: None,
            state: Connectivity::Disconnected,
        }
    }

    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn active_mode(&self) -> Option<&str> {
        self.active_mode.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, Connectivity::Connected { .. })
    }

    /// The cached offset. `None` unless connected.
    pub fn timezone(&self) -> Option<TimezoneResolver> {
        match &self.state {
            Connectivity::Connected { tz, .. } => Some(*tz),
            Connectivity::Disconnected => None,
        }
    }

    /// Selects the mode used by the next connect.
    ///
    /// An unknown name fails before the current session is touched. Selecting
    /// the mode that is already connected keeps the session; any other mode
    /// tears it down. The new session is not opened here.
    pub async fn set_mode(&mut self, name: &str) -> Result<(), IngestError> {
        let mode = self.registry.get(name)?.mode.clone();

        if let Connectivity::Connected { mode: current, .. } = &self.state {
            if *current == mode {
                self.active_mode = Some(mode);
                return Ok(());
            }
        }

        self.disconnect().await;
        info!(mode = %mode, "mode selected");
        self.active_mode = Some(mode);
        Ok(())
    }

    /// Closes the terminal session. A no-op when already disconnected.
    pub async fn disconnect(&mut self) {
        if let Connectivity::Connected { mode, .. } = &self.state {
            info!(mode = %mode, source = self.source.name(), "disconnecting");
            self.source.shutdown().await;
            self.state = Connectivity::Disconnected;
        }
    }

    /// Connects under the active mode unless already connected, and returns the
    /// session's timezone resolver.
    ///
    /// On failure the session stays disconnected and no offset is cached.
    pub async fn ensure_connected(&mut self) -> Result<TimezoneResolver, IngestError> {
        if let Connectivity::Connected { tz, .. } = &self.state {
            return Ok(*tz);
        }

        let mode = self.active_mode.clone().ok_or(IngestError::NoActiveMode)?;
        let profile = self.registry.get(&mode)?;

        let info = self
            .source
            .initialize(profile)
            .await
            .map_err(|diagnostic| IngestError::Connection {
                mode: mode.clone(),
                diagnostic,
            })?;

        let Some(tz) = TimezoneResolver::from_offset_secs(info.timezone_offset_secs) else {
            warn!(
                mode = %mode,
                offset_secs = info.timezone_offset_secs,
                "terminal reported an impossible utc offset"
            );
            self.source.shutdown().await;
            return Err(IngestError::Connection {
                mode,
                diagnostic: Diagnostic::new(
                    Diagnostic::INVALID_PARAMS,
                    format!("utc offset {}s is out of range", info.timezone_offset_secs),
                ),
            });
        };

        info!(
            mode = %mode,
            source = self.source.name(),
            server = info.server.as_deref().unwrap_or(""),
            utc_offset = %tz.offset(),
            "connected"
        );
        self.state = Connectivity::Connected { mode, tz };
        Ok(tz)
    }

    /// Connects if needed and hands out a fetcher bound to this session.
    pub async fn fetcher(
        &mut self,
        settings: FetchSettings,
    ) -> Result<SeriesFetcher<'_, S>, IngestError> {
        let tz = self.ensure_connected().await?;
        let mode = self.active_mode.clone().ok_or(IngestError::NoActiveMode)?;
        Ok(SeriesFetcher::new(&mut self.source, tz, mode, settings))
    }

    /// Connects if needed and gives direct access to the source.
    pub async fn connected_source(&mut self) -> Result<&mut S, IngestError> {
        self.ensure_connected().await?;
        Ok(&mut self.source)
    }
}
