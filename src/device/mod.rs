//! Simulated cabin devices: the state store and its two controllers.

pub mod catalog;
pub mod playback;
pub mod temperature;

use serde::Serialize;

/// Playback status. A track alias exists exactly while playing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Playback {
    #[default]
    Idle,
    Playing { track: String },
}

impl Playback {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    pub fn track(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Playing { track } => Some(track.as_str()),
        }
    }
}

/// In-memory record of cabin temperature and playback status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub temperature: i32,
    pub playback: Playback,
}

impl DeviceState {
    pub fn new(temperature: i32) -> Self {
        Self {
            temperature,
            playback: Playback::Idle,
        }
    }

    /// Display view of the current state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            temperature: self.temperature,
            playback: PlaybackSnapshot {
                is_playing: self.playback.is_playing(),
                track_id: self.playback.track().map(str::to_string),
            },
        }
    }
}

/// Serialized form of [`DeviceState`] sent to the display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub temperature: i32,
    pub playback: PlaybackSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub track_id: Option<String>,
}
