//! The cabin session: sole owner of the device state.
//!
//! Every mutation goes through `&mut Session`, so whoever holds the session
//! (the main loop) is the only writer.

use serde::Serialize;
use tracing::{info, warn};

use crate::command::{classify, normalize, Intent, UnrecognizedReason};
use crate::device::catalog::TrackCatalog;
use crate::device::playback::{PlaybackController, PlaybackError};
use crate::device::temperature::{self, STEP};
use crate::device::{DeviceState, StateSnapshot};

/// Result of applying one command, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    /// The normalized command text.
    pub command: String,
    pub intent: Intent,
    pub message: String,
    /// Whether the device state was (or could have been) changed.
    pub applied: bool,
    pub state: StateSnapshot,
}

pub struct Session {
    state: DeviceState,
    playback: PlaybackController,
}

impl Session {
    pub fn new(initial_temperature: i32, playback: PlaybackController) -> Self {
        Self {
            state: DeviceState::new(initial_temperature),
            playback,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    pub fn catalog(&self) -> &TrackCatalog {
        self.playback.catalog()
    }

    /// Interpret a raw command line and apply it.
    pub fn apply(&mut self, raw: &str) -> CommandOutcome {
        let command = normalize(raw);
        let intent = classify(&command, self.playback.catalog());
        info!(command = %command, intent = %intent, "Command classified");

        let (applied, message) = self.dispatch(&intent, &command);
        if !applied {
            warn!(command = %command, message = %message, "Command not applied");
        }

        CommandOutcome {
            command,
            intent,
            message,
            applied,
            state: self.snapshot(),
        }
    }

    /// Display "+" button.
    pub fn increase_temperature(&mut self) -> i32 {
        temperature::adjust_temperature(&mut self.state, STEP)
    }

    /// Display "-" button.
    pub fn decrease_temperature(&mut self) -> i32 {
        temperature::adjust_temperature(&mut self.state, -STEP)
    }

    /// Display "Stop Music" button.
    pub fn stop_playback(&mut self) {
        self.playback.stop(&mut self.state);
    }

    fn dispatch(&mut self, intent: &Intent, command: &str) -> (bool, String) {
        match intent {
            Intent::SetTemperature(value) => {
                let t = temperature::set_temperature(&mut self.state, *value);
                (true, format!("Temperature set to {t}°C."))
            }
            Intent::IncreaseTemperature => {
                let t = self.increase_temperature();
                (true, format!("Temperature increased to {t}°C."))
            }
            Intent::DecreaseTemperature => {
                let t = self.decrease_temperature();
                (true, format!("Temperature decreased to {t}°C."))
            }
            Intent::PlayTrack(alias) => match self.playback.play(&mut self.state, alias) {
                Ok(()) => (true, format!("Playing {alias}.")),
                Err(PlaybackError::TrackNotFound { alias }) => {
                    (false, format!("Track not found: {alias}."))
                }
                Err(e @ PlaybackError::Output { .. }) => (false, capitalize(&e.to_string())),
            },
            Intent::StopTrack => {
                self.stop_playback();
                (true, "Music stopped.".to_string())
            }
            Intent::FetchDirections => (false, "Directions are not available yet.".to_string()),
            Intent::Unrecognized(reason) => (false, unrecognized_message(*reason, command)),
        }
    }
}

fn unrecognized_message(reason: UnrecognizedReason, command: &str) -> String {
    match reason {
        UnrecognizedReason::NoMatch => format!("Sorry, I didn't understand \"{command}\"."),
        UnrecognizedReason::MalformedTemperature => {
            format!("Could not read a temperature from \"{command}\".")
        }
        UnrecognizedReason::UnknownTrack => format!("No track matches \"{command}\"."),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::device::playback::tests::{OutputCall, RecordingOutput};
    use crate::device::Playback;

    struct Fixture {
        session: Session,
        calls: std::sync::Arc<std::sync::Mutex<Vec<OutputCall>>>,
        _dir: tempfile::TempDir,
    }

    fn fixture(output: RecordingOutput) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("songs")).unwrap();
        std::fs::write(dir.path().join("songs/song1.mp3"), b"fake").unwrap();
        let calls = output.calls.clone();
        let controller = PlaybackController::new(TrackCatalog::builtin(dir.path()), Box::new(output));
        Fixture {
            session: Session::new(22, controller),
            calls,
            _dir: dir,
        }
    }

    #[test]
    fn test_scenario() {
        let mut fx = fixture(RecordingOutput::default());
        let s = &mut fx.session;
        assert_eq!(s.state(), &DeviceState::new(22));

        let out = s.apply("temperature increase");
        assert!(out.applied);
        assert_eq!(out.message, "Temperature increased to 23°C.");
        assert_eq!(s.state().temperature, 23);
        assert_eq!(s.state().playback, Playback::Idle);

        let out = s.apply("play first song");
        assert_eq!(out.intent, Intent::PlayTrack("first song".into()));
        assert_eq!(out.message, "Playing first song.");
        assert_eq!(s.state().temperature, 23);
        assert_eq!(s.state().playback.track(), Some("first song"));
        assert!(out.state.playback.is_playing);

        let out = s.apply("stop");
        assert_eq!(out.message, "Music stopped.");
        assert_eq!(s.state(), &DeviceState::new(23));
        assert_eq!(fx.calls.lock().unwrap().last(), Some(&OutputCall::Stop));
    }

    #[test]
    fn test_set_temperature_message() {
        let mut fx = fixture(RecordingOutput::default());
        let out = fx.session.apply("Temperature set to 18°C");
        assert_eq!(out.intent, Intent::SetTemperature(18));
        assert_eq!(out.message, "Temperature set to 18°C.");
        assert_eq!(out.state.temperature, 18);
    }

    #[test]
    fn test_malformed_temperature_is_noop() {
        let mut fx = fixture(RecordingOutput::default());
        let out = fx.session.apply("temperature set to warm");
        assert!(!out.applied);
        assert_eq!(
            out.intent,
            Intent::Unrecognized(UnrecognizedReason::MalformedTemperature)
        );
        assert_eq!(out.message, "Could not read a temperature from \"temperature set to warm\".");
        assert_eq!(fx.session.state().temperature, 22);
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let mut fx = fixture(RecordingOutput::default());
        fx.session.apply("play first song");

        let out = fx.session.apply("play second song");

        assert!(!out.applied);
        assert_eq!(out.message, "Track not found: second song.");
        assert_eq!(fx.session.state().playback.track(), Some("first song"));
    }

    #[test]
    fn test_output_failure_message() {
        let mut fx = fixture(RecordingOutput {
            fail: true,
            ..Default::default()
        });
        let out = fx.session.apply("play first song");
        assert!(!out.applied);
        assert!(out.message.starts_with("Could not play first song"));
        assert_eq!(fx.session.state().playback, Playback::Idle);
    }

    #[test]
    fn test_unrecognized_and_directions() {
        let mut fx = fixture(RecordingOutput::default());
        let before = fx.session.state().clone();

        let out = fx.session.apply("Banana");
        assert_eq!(out.intent, Intent::Unrecognized(UnrecognizedReason::NoMatch));
        assert_eq!(out.message, "Sorry, I didn't understand \"banana\".");

        let out = fx.session.apply("directions to the airport");
        assert_eq!(out.intent, Intent::FetchDirections);
        assert!(!out.applied);

        let out = fx.session.apply("play the radio");
        assert_eq!(out.message, "No track matches \"play the radio\".");

        assert_eq!(fx.session.state(), &before);
    }

    #[test]
    fn test_buttons() {
        let mut fx = fixture(RecordingOutput::default());
        assert_eq!(fx.session.increase_temperature(), 23);
        assert_eq!(fx.session.decrease_temperature(), 22);
        assert_eq!(fx.session.decrease_temperature(), 21);
        fx.session.stop_playback();
        fx.session.stop_playback();
        assert_eq!(fx.session.state().playback, Playback::Idle);
    }

    proptest! {
        #[test]
        fn prop_voice_steps_sum(steps in prop::collection::vec(any::<bool>(), 0..50)) {
            let mut fx = fixture(RecordingOutput::default());
            let mut expected = 22;
            for up in steps {
                if up {
                    fx.session.apply("temperature increase");
                    expected += 1;
                } else {
                    fx.session.apply("decrease the temperature");
                    expected -= 1;
                }
            }
            prop_assert_eq!(fx.session.state().temperature, expected);
        }

        #[test]
        fn prop_set_via_command(n in -10_000i32..10_000) {
            let mut fx = fixture(RecordingOutput::default());
            let out = fx.session.apply(&format!("temperature set to {n}"));
            prop_assert_eq!(out.intent, Intent::SetTemperature(n));
            prop_assert_eq!(fx.session.state().temperature, n);
        }
    }
}
