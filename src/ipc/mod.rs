//! IPC protocol types for communication with the display front-end.
//!
//! Events use `{"event": "<name>", "data": {...}}` format (core -> display).
//! Commands use `{"command": "<name>", ...}` format (display -> core).

pub mod bridge;

use serde::{Deserialize, Serialize};

use crate::command::Intent;
use crate::device::catalog::TrackInfo;
use crate::device::StateSnapshot;
use crate::session::CommandOutcome;

// ---------------------------------------------------------------------------
// Events: core -> display (stdout)
// ---------------------------------------------------------------------------

/// All events emitted to the display via stdout as JSON lines.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum CabinEvent {
    Starting {},
    Loading {
        step: String,
    },
    Ready {
        state: StateSnapshot,
    },
    Listening {},
    ListenerStopped {},
    Transcription {
        text: String,
    },
    NoSpeech {},
    CommandResult {
        command: String,
        intent: Intent,
        message: String,
        applied: bool,
        state: StateSnapshot,
    },
    State(StateSnapshot),
    Advisory {
        command: String,
        text: String,
    },
    Tracks {
        tracks: Vec<TrackInfo>,
    },
    AudioDevices {
        input: Vec<String>,
        output: Vec<String>,
    },
    Error {
        message: String,
    },
    Pong {},
    Stopping {},
}

impl From<CommandOutcome> for CabinEvent {
    fn from(outcome: CommandOutcome) -> Self {
        Self::CommandResult {
            command: outcome.command,
            intent: outcome.intent,
            message: outcome.message,
            applied: outcome.applied,
            state: outcome.state,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands: display -> core (stdin)
// ---------------------------------------------------------------------------

/// All commands received from the display via stdin as JSON lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum CabinCommand {
    /// A typed command, handled exactly like a transcript.
    Text {
        text: String,
    },
    IncreaseTemperature {},
    DecreaseTemperature {},
    StopMusic {},
    GetState {},
    ListTracks {},
    ListAudioDevices {},
    StartListening {},
    StopListening {},
    Ping {},
    Stop {},
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceState;

    #[test]
    fn test_command_parsing() {
        let cmd: CabinCommand =
            serde_json::from_str(r#"{"command":"text","text":"play first song"}"#).unwrap();
        assert_eq!(
            cmd,
            CabinCommand::Text {
                text: "play first song".into()
            }
        );

        let cmd: CabinCommand =
            serde_json::from_str(r#"{"command":"increase_temperature"}"#).unwrap();
        assert_eq!(cmd, CabinCommand::IncreaseTemperature {});

        assert!(serde_json::from_str::<CabinCommand>(r#"{"command":"reboot"}"#).is_err());
    }

    #[test]
    fn test_state_event_shape() {
        let event = CabinEvent::State(DeviceState::new(22).snapshot());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "state");
        assert_eq!(json["data"]["temperature"], 22);
        assert_eq!(json["data"]["playback"]["isPlaying"], false);
    }

    #[test]
    fn test_command_result_shape() {
        let event = CabinEvent::CommandResult {
            command: "stop".into(),
            intent: Intent::StopTrack,
            message: "Music stopped.".into(),
            applied: true,
            state: DeviceState::new(23).snapshot(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "command_result");
        assert_eq!(json["data"]["intent"]["kind"], "stop_track");
        assert_eq!(json["data"]["state"]["temperature"], 23);
    }

    #[test]
    fn test_unit_like_event() {
        let json = serde_json::to_string(&CabinEvent::Pong {}).unwrap();
        assert_eq!(json, r#"{"event":"pong","data":{}}"#);
    }
}
