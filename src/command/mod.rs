//! Command interpretation: normalization and intent classification.

pub mod classifier;

use std::fmt;

use serde::Serialize;

pub use classifier::classify;

/// Lower-case and trim a raw command line.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// The classified meaning of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Intent {
    SetTemperature(i32),
    IncreaseTemperature,
    DecreaseTemperature,
    /// Carries the matched catalog alias.
    PlayTrack(String),
    StopTrack,
    FetchDirections,
    Unrecognized(UnrecognizedReason),
}

/// Why a command did not map to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedReason {
    NoMatch,
    /// "temperature ... set to" without a readable integer.
    MalformedTemperature,
    /// "play" without any catalog alias.
    UnknownTrack,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetTemperature(n) => write!(f, "set_temperature({n})"),
            Self::IncreaseTemperature => write!(f, "increase_temperature"),
            Self::DecreaseTemperature => write!(f, "decrease_temperature"),
            Self::PlayTrack(alias) => write!(f, "play_track({alias})"),
            Self::StopTrack => write!(f, "stop_track"),
            Self::FetchDirections => write!(f, "fetch_directions"),
            Self::Unrecognized(reason) => write!(f, "unrecognized({reason:?})"),
        }
    }
}
