//! Voice listener thread: microphone -> segmenter -> utterance channel.
//!
//! The cpal stream is created and dropped on the listener thread. While the
//! main loop is processing an utterance the listener throws audio away, so
//! at most one spoken command is ever in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::capture::CHUNK_SAMPLES;
use crate::audio::ring_buffer::DEFAULT_CAPACITY;
use crate::audio::{sample_queue, start_capture, ListenerState, ListenerStateMachine};
use crate::ipc::bridge::{emit_error, emit_event};
use crate::ipc::CabinEvent;
use crate::vad::{SegmentEvent, SegmenterConfig, UtteranceSegmenter};

const IDLE_POLL: Duration = Duration::from_millis(10);

/// One recorded utterance, 16 kHz mono.
#[derive(Debug)]
pub struct Utterance {
    pub id: Uuid,
    pub audio: Vec<f32>,
}

pub struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Ask the thread to exit and wait for it.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Listener thread panicked");
            }
        }
    }
}

/// Start the listener thread. Fails if one is already running.
pub fn spawn_listener(
    device: Option<String>,
    state: Arc<ListenerStateMachine>,
    tx: mpsc::Sender<Utterance>,
) -> anyhow::Result<ListenerHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let thread_state = state.clone();

    let thread = claim_and_launch(&state, move || {
        std::thread::Builder::new()
            .name("cabin-listener".into())
            .spawn(move || {
                if let Err(e) = run(device.as_deref(), &thread_state, &stop_flag, &tx) {
                    error!("Listener failed: {:#}", e);
                    emit_error(&format!("Voice input stopped: {}", e));
                }
                thread_state.reset();
                emit_event(&CabinEvent::ListenerStopped {});
                debug!("Listener thread exiting");
            })
    })?;

    Ok(ListenerHandle {
        stop,
        thread: Some(thread),
    })
}

/// Move the listener out of Idle and run `launch`. The state goes back to
/// Idle if `launch` fails.
fn claim_and_launch<T>(
    state: &ListenerStateMachine,
    launch: impl FnOnce() -> std::io::Result<T>,
) -> anyhow::Result<T> {
    if !state.start() {
        anyhow::bail!("Listener already running ({})", state.current());
    }
    launch().map_err(|e| {
        state.reset();
        anyhow::Error::from(e).context("Failed to spawn listener thread")
    })
}

/// Hand a finished utterance to the main loop.
/// Returns `false` once the main loop has gone away.
fn hand_over(state: &ListenerStateMachine, tx: &mpsc::Sender<Utterance>, audio: Vec<f32>) -> bool {
    if !state.begin_processing() {
        warn!(state = %state.current(), "Listener not capturing, dropping utterance");
        return true;
    }
    let utterance = Utterance {
        id: Uuid::new_v4(),
        audio,
    };
    debug!(id = %utterance.id, samples = utterance.audio.len(), "Utterance captured");
    tx.blocking_send(utterance).is_ok()
}

fn run(
    device: Option<&str>,
    state: &ListenerStateMachine,
    stop: &AtomicBool,
    tx: &mpsc::Sender<Utterance>,
) -> anyhow::Result<()> {
    let (producer, mut consumer) = sample_queue(DEFAULT_CAPACITY);
    let _stream = start_capture(producer, device)?;

    let mut segmenter = UtteranceSegmenter::new(SegmenterConfig::default());
    let mut chunk = vec![0.0f32; CHUNK_SAMPLES];
    info!("Calibrating for ambient noise");

    while !stop.load(Ordering::SeqCst) {
        if state.current() == ListenerState::Processing {
            consumer.clear();
            segmenter.reset();
            std::thread::sleep(IDLE_POLL);
            continue;
        }
        if !consumer.pop_chunk(&mut chunk) {
            std::thread::sleep(IDLE_POLL);
            continue;
        }

        match segmenter.push(&chunk) {
            Some(SegmentEvent::Calibrated { threshold }) => {
                state.calibrated();
                info!(threshold, "Listening for voice commands");
                emit_event(&CabinEvent::Listening {});
            }
            Some(SegmentEvent::SpeechStarted) => {
                state.speech_started();
                debug!(threshold = ?segmenter.threshold(), "Speech started");
            }
            Some(SegmentEvent::Discarded) => {
                state.speech_discarded();
                debug!("Utterance too short, discarded");
            }
            Some(SegmentEvent::Utterance(audio)) => {
                if !hand_over(state, tx, audio) {
                    break;
                }
            }
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing() -> Arc<ListenerStateMachine> {
        let state = ListenerStateMachine::new();
        state.start();
        state.calibrated();
        state.speech_started();
        state
    }

    #[test]
    fn test_failed_launch_releases_listener() {
        let state = ListenerStateMachine::new();
        let result: anyhow::Result<()> =
            claim_and_launch(&state, || Err(std::io::Error::other("no threads left")));
        assert!(result.is_err());
        assert_eq!(state.current(), ListenerState::Idle);

        let relaunched = claim_and_launch(&state, || Ok(7));
        assert_eq!(relaunched.unwrap(), 7);
        assert_eq!(state.current(), ListenerState::Calibrating);
    }

    #[test]
    fn test_launch_while_running_is_refused() {
        let state = ListenerStateMachine::new();
        state.start();
        let mut launched = false;
        let result = claim_and_launch(&state, || {
            launched = true;
            Ok(())
        });
        assert!(result.is_err());
        assert!(!launched);
        assert_eq!(state.current(), ListenerState::Calibrating);
    }

    #[test]
    fn test_hand_over_marks_processing() {
        let state = capturing();
        let (tx, mut rx) = mpsc::channel(1);

        assert!(hand_over(&state, &tx, vec![0.5; 4]));

        assert_eq!(state.current(), ListenerState::Processing);
        assert_eq!(rx.try_recv().unwrap().audio, vec![0.5; 4]);
    }

    #[test]
    fn test_hand_over_skips_when_not_capturing() {
        let state = capturing();
        state.reset();
        let (tx, mut rx) = mpsc::channel(1);

        assert!(hand_over(&state, &tx, vec![0.5; 4]));

        assert_eq!(state.current(), ListenerState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_hand_over_reports_closed_channel() {
        let state = capturing();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(!hand_over(&state, &tx, vec![0.1]));
    }
}
