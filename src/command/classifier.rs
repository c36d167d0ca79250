//! Keyword-based intent classifier.
//!
//! Matching is plain substring search with no word boundaries. Rules are
//! checked in a fixed order and the first one that fires decides the intent,
//! so "play ... stop" is a play command and "stop the temperature" is a
//! temperature command.

use crate::device::catalog::TrackCatalog;

use super::{Intent, UnrecognizedReason};

const SET_TO: &str = "set to";

/// Unit markers accepted after a temperature target, longest first.
const UNIT_MARKERS: &[&str] = &[
    "degrees celsius",
    "degrees c",
    "celsius",
    "degrees",
    "° c",
    "°c",
    "°",
    "c",
];

/// Classify an already-normalized command.
pub fn classify(command: &str, catalog: &TrackCatalog) -> Intent {
    if command.contains("temperature") {
        return classify_temperature(command);
    }

    if command.contains("play") {
        return match catalog.find_in(command) {
            Some(track) => Intent::PlayTrack(track.alias.clone()),
            None => Intent::Unrecognized(UnrecognizedReason::UnknownTrack),
        };
    }

    if command.contains("stop") {
        return Intent::StopTrack;
    }

    if command.contains("directions") {
        return Intent::FetchDirections;
    }

    Intent::Unrecognized(UnrecognizedReason::NoMatch)
}

fn classify_temperature(command: &str) -> Intent {
    if let Some(idx) = command.find(SET_TO) {
        return match parse_target(&command[idx + SET_TO.len()..]) {
            Some(value) => Intent::SetTemperature(value),
            None => Intent::Unrecognized(UnrecognizedReason::MalformedTemperature),
        };
    }
    if command.contains("increase") {
        return Intent::IncreaseTemperature;
    }
    if command.contains("decrease") {
        return Intent::DecreaseTemperature;
    }
    Intent::Unrecognized(UnrecognizedReason::NoMatch)
}

/// Parse the integer following "set to", tolerating a unit marker and
/// trailing sentence punctuation from transcription.
fn parse_target(rest: &str) -> Option<i32> {
    let mut text = rest.trim().trim_end_matches(['.', '!', '?']).trim_end();
    for marker in UNIT_MARKERS {
        if let Some(stripped) = text.strip_suffix(marker) {
            text = stripped.trim_end();
            break;
        }
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::command::normalize;

    fn catalog() -> TrackCatalog {
        TrackCatalog::builtin(Path::new("."))
    }

    fn classify_raw(raw: &str) -> Intent {
        classify(&normalize(raw), &catalog())
    }

    #[test]
    fn test_set_temperature() {
        assert_eq!(classify_raw("temperature set to 18°C"), Intent::SetTemperature(18));
        assert_eq!(classify_raw("Set the temperature set to 25"), Intent::SetTemperature(25));
        assert_eq!(classify_raw("temperature set to -3 degrees."), Intent::SetTemperature(-3));
        assert_eq!(classify_raw("temperature set to 21 °C"), Intent::SetTemperature(21));
        assert_eq!(classify_raw("temperature set to 30c"), Intent::SetTemperature(30));
        assert_eq!(classify_raw("temperature set to 18 degrees c"), Intent::SetTemperature(18));
        assert_eq!(classify_raw("Temperature set to 19 Degrees C."), Intent::SetTemperature(19));
    }

    #[test]
    fn test_set_temperature_malformed() {
        for raw in [
            "temperature set to",
            "temperature set to twenty",
            "temperature set to 18.5",
            "temperature set to 18 please",
        ] {
            assert_eq!(
                classify_raw(raw),
                Intent::Unrecognized(UnrecognizedReason::MalformedTemperature),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_set_to_wins_over_increase() {
        assert_eq!(
            classify_raw("increase temperature set to 24"),
            Intent::SetTemperature(24)
        );
    }

    #[test]
    fn test_increase_decrease() {
        assert_eq!(classify_raw("temperature increase"), Intent::IncreaseTemperature);
        assert_eq!(classify_raw("Please decrease the temperature"), Intent::DecreaseTemperature);
    }

    #[test]
    fn test_temperature_without_action() {
        assert_eq!(
            classify_raw("what is the temperature"),
            Intent::Unrecognized(UnrecognizedReason::NoMatch)
        );
    }

    #[test]
    fn test_play_track() {
        assert_eq!(
            classify_raw("play first song"),
            Intent::PlayTrack("first song".to_string())
        );
        assert_eq!(
            classify_raw("Play song two"),
            Intent::PlayTrack("song two".to_string())
        );
    }

    #[test]
    fn test_play_unknown_track() {
        assert_eq!(
            classify_raw("play something nice"),
            Intent::Unrecognized(UnrecognizedReason::UnknownTrack)
        );
    }

    #[test]
    fn test_play_beats_stop() {
        assert_eq!(
            classify_raw("stop and play second song"),
            Intent::PlayTrack("second song".to_string())
        );
        assert_eq!(
            classify_raw("stop playing"),
            Intent::Unrecognized(UnrecognizedReason::UnknownTrack)
        );
    }

    #[test]
    fn test_temperature_beats_everything() {
        assert_eq!(
            classify_raw("stop the temperature increase and play first song"),
            Intent::IncreaseTemperature
        );
    }

    #[test]
    fn test_stop_and_directions() {
        assert_eq!(classify_raw("stop"), Intent::StopTrack);
        assert_eq!(classify_raw("Stop music"), Intent::StopTrack);
        assert_eq!(classify_raw("get directions home"), Intent::FetchDirections);
        assert_eq!(classify_raw("stop directions"), Intent::StopTrack);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(
            classify_raw("banana"),
            Intent::Unrecognized(UnrecognizedReason::NoMatch)
        );
        assert_eq!(classify_raw(""), Intent::Unrecognized(UnrecognizedReason::NoMatch));
    }
}
