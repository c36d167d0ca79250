//! Atomic listener state.
//!
//! Shared between the listener thread, which captures and segments speech,
//! and the main loop, which marks the listener busy while it transcribes and
//! applies a command. Audio arriving while busy is discarded.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ListenerState {
    /// No listener thread running.
    Idle = 0,
    /// Measuring ambient noise to pick an energy threshold.
    Calibrating = 1,
    /// Waiting for speech.
    Listening = 2,
    /// Speech detected, recording the utterance.
    Capturing = 3,
    /// An utterance is being transcribed and applied.
    Processing = 4,
}

impl ListenerState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Calibrating,
            2 => Self::Listening,
            3 => Self::Capturing,
            4 => Self::Processing,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for ListenerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Calibrating => write!(f, "calibrating"),
            Self::Listening => write!(f, "listening"),
            Self::Capturing => write!(f, "capturing"),
            Self::Processing => write!(f, "processing"),
        }
    }
}

/// Thread-safe listener state, shareable via `Arc`.
#[derive(Debug)]
pub struct ListenerStateMachine {
    state: AtomicU8,
}

impl ListenerStateMachine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn current(&self) -> ListenerState {
        ListenerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.current() != ListenerState::Idle
    }

    /// Idle -> Calibrating. Fails if a listener is already running.
    pub fn start(&self) -> bool {
        self.transition(ListenerState::Idle, ListenerState::Calibrating)
    }

    /// Calibrating -> Listening.
    pub fn calibrated(&self) -> bool {
        self.transition(ListenerState::Calibrating, ListenerState::Listening)
    }

    /// Listening -> Capturing.
    pub fn speech_started(&self) -> bool {
        self.transition(ListenerState::Listening, ListenerState::Capturing)
    }

    /// Capturing -> Listening, for utterances that were dropped.
    pub fn speech_discarded(&self) -> bool {
        self.transition(ListenerState::Capturing, ListenerState::Listening)
    }

    /// Capturing -> Processing, once an utterance is handed over.
    pub fn begin_processing(&self) -> bool {
        self.transition(ListenerState::Capturing, ListenerState::Processing)
    }

    /// Processing -> Listening.
    pub fn finish_processing(&self) -> bool {
        self.transition(ListenerState::Processing, ListenerState::Listening)
    }

    /// Force back to Idle (stop request or capture failure).
    pub fn reset(&self) {
        self.state.store(ListenerState::Idle as u8, Ordering::Release);
    }

    fn transition(&self, from: ListenerState, to: ListenerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for ListenerStateMachine {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(ListenerState::Idle as u8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let sm = ListenerStateMachine::new();
        assert_eq!(sm.current(), ListenerState::Idle);
        assert!(sm.start());
        assert!(!sm.start());
        assert!(sm.calibrated());
        assert!(sm.speech_started());
        assert!(sm.begin_processing());
        assert_eq!(sm.current(), ListenerState::Processing);
        assert!(!sm.speech_started());
        assert!(sm.finish_processing());
        assert_eq!(sm.current(), ListenerState::Listening);
    }

    #[test]
    fn test_discarded_speech_returns_to_listening() {
        let sm = ListenerStateMachine::new();
        sm.start();
        sm.calibrated();
        sm.speech_started();
        assert!(sm.speech_discarded());
        assert_eq!(sm.current(), ListenerState::Listening);
    }

    #[test]
    fn test_reset_from_any_state() {
        let sm = ListenerStateMachine::new();
        sm.start();
        sm.calibrated();
        sm.reset();
        assert!(!sm.is_running());
        assert!(!sm.finish_processing());
    }
}
