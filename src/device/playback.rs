//! Playback controller: alias resolution plus play/stop requests.
//!
//! Whether the output device mixes tracks or replaces the current one is up
//! to the [`AudioOutput`] implementation. The controller only tracks which
//! alias was last started successfully.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audio::output::AudioOutput;

use super::catalog::TrackCatalog;
use super::{DeviceState, Playback};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// Alias unknown to the catalog, or its file is missing.
    #[error("track not found: {alias}")]
    TrackNotFound { alias: String },
    /// The audio output refused the file.
    #[error("could not play {alias}: {reason}")]
    Output { alias: String, reason: String },
}

pub struct PlaybackController {
    catalog: TrackCatalog,
    output: Box<dyn AudioOutput>,
}

impl PlaybackController {
    pub fn new(catalog: TrackCatalog, output: Box<dyn AudioOutput>) -> Self {
        Self { catalog, output }
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    /// Start `alias`. On any failure `state.playback` is left as it was.
    pub fn play(&mut self, state: &mut DeviceState, alias: &str) -> Result<(), PlaybackError> {
        let path = match self.catalog.resolve(alias) {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => {
                warn!(alias, path = %path.display(), "Track file missing");
                return Err(PlaybackError::TrackNotFound {
                    alias: alias.to_string(),
                });
            }
            None => {
                return Err(PlaybackError::TrackNotFound {
                    alias: alias.to_string(),
                })
            }
        };

        self.output.play(&path).map_err(|e| PlaybackError::Output {
            alias: alias.to_string(),
            reason: e.to_string(),
        })?;

        info!(alias, path = %path.display(), output = self.output.name(), "Playback started");
        state.playback = Playback::Playing {
            track: alias.to_string(),
        };
        Ok(())
    }

    /// Stop playback. Always reaches Idle, whether or not anything played.
    pub fn stop(&mut self, state: &mut DeviceState) {
        debug!(was_playing = state.playback.is_playing(), "Stopping playback");
        self.output.stop();
        state.playback = Playback::Idle;
    }
}
