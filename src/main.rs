//! Cabin core: infotainment control process.
//!
//! Talks to the display front-end via JSON-line IPC on stdin/stdout,
//! owns the simulated cabin state, and optionally listens for spoken
//! commands through a hosted speech-to-text service.

mod advisor;
mod audio;
mod command;
mod config;
mod device;
mod ipc;
mod listener;
mod logging;
mod session;
mod stt;
mod vad;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument};

use advisor::Advisor;
use audio::{list_input_devices, list_output_devices, open_default_output, ListenerStateMachine};
use config::{read_cabin_config, CabinConfig};
use device::catalog::TrackCatalog;
use device::playback::PlaybackController;
use ipc::bridge::{emit_error, emit_event, spawn_stdin_reader};
use ipc::{CabinCommand, CabinEvent};
use listener::{ListenerHandle, Utterance};
use session::{CommandOutcome, Session};
use stt::{create_stt_engine, SttAdapter, TranscriptionError};

#[tokio::main]
async fn main() {
    logging::init();

    emit_event(&CabinEvent::Starting {});

    emit_event(&CabinEvent::Loading {
        step: "Reading configuration...".to_string(),
    });
    let config = read_cabin_config();
    info!(
        initial_temperature = config.initial_temperature,
        tracks = config.tracks.len(),
        stt_adapter = %config.stt.adapter,
        advisor = config.advisor.enabled,
        auto_listen = config.auto_listen,
        "Configuration loaded"
    );

    emit_event(&CabinEvent::Loading {
        step: "Opening audio output...".to_string(),
    });
    let (utterance_tx, mut utterance_rx) = mpsc::channel::<Utterance>(1);
    let mut core = Core::new(&config, utterance_tx);

    emit_event(&CabinEvent::Loading {
        step: "Starting IPC bridge...".to_string(),
    });
    let mut cmd_rx = spawn_stdin_reader();

    if config.auto_listen {
        core.start_listening();
    }

    emit_event(&CabinEvent::Ready {
        state: core.session.snapshot(),
    });
    info!("Cabin core ready");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(command) => {
                        let stops_listener = matches!(command, CabinCommand::StopListening {});
                        if !core.handle_command(command) {
                            break;
                        }
                        if stops_listener {
                            drain_utterances(&mut utterance_rx);
                        }
                    }
                    None => {
                        info!("stdin closed, shutting down");
                        break;
                    }
                }
            }
            Some(utterance) = utterance_rx.recv() => {
                core.handle_utterance(utterance).await;
            }
        }
    }

    core.stop_listening();
    info!("Cabin core shutting down");
}

/// Everything the main loop owns. Only the main task touches it.
struct Core {
    session: Session,
    stt: Option<SttAdapter>,
    advisor: Option<Arc<Advisor>>,
    input_device: Option<String>,
    listener_state: Arc<ListenerStateMachine>,
    listener: Option<ListenerHandle>,
    utterance_tx: mpsc::Sender<Utterance>,
}

impl Core {
    fn new(config: &CabinConfig, utterance_tx: mpsc::Sender<Utterance>) -> Self {
        let catalog = TrackCatalog::from_config(config);
        if catalog.is_empty() {
            warn!("Track catalog is empty, play commands will not match");
        }
        for track in catalog.iter() {
            debug!(alias = %track.alias, path = %track.path.display(), "Track");
        }
        info!(tracks = catalog.len(), "Track catalog loaded");
        let playback = PlaybackController::new(catalog, open_default_output());

        let stt = match create_stt_engine(&config.stt) {
            Ok(engine) => {
                info!(adapter = engine.name(), "Speech-to-text ready");
                Some(engine)
            }
            Err(e) => {
                warn!("Voice input unavailable: {}", e);
                None
            }
        };

        Self {
            session: Session::new(config.initial_temperature, playback),
            stt,
            advisor: Advisor::from_settings(&config.advisor).map(Arc::new),
            input_device: config.input_device.clone(),
            listener_state: ListenerStateMachine::new(),
            listener: None,
            utterance_tx,
        }
    }

    /// Handle a single command from the display.
    /// Returns `false` if the main loop should exit.
    fn handle_command(&mut self, cmd: CabinCommand) -> bool {
        match cmd {
            CabinCommand::Text { text } => self.run_command(&text),

            CabinCommand::IncreaseTemperature {} => {
                let t = self.session.increase_temperature();
                info!(temperature = t, "Temperature increased from display");
                self.emit_state();
            }

            CabinCommand::DecreaseTemperature {} => {
                let t = self.session.decrease_temperature();
                info!(temperature = t, "Temperature decreased from display");
                self.emit_state();
            }

            CabinCommand::StopMusic {} => {
                self.session.stop_playback();
                self.emit_state();
            }

            CabinCommand::GetState {} => self.emit_state(),

            CabinCommand::ListTracks {} => {
                emit_event(&CabinEvent::Tracks {
                    tracks: self.session.catalog().describe(),
                });
            }

            CabinCommand::ListAudioDevices {} => {
                emit_event(&CabinEvent::AudioDevices {
                    input: list_input_devices(),
                    output: list_output_devices(),
                });
            }

            CabinCommand::StartListening {} => self.start_listening(),

            CabinCommand::StopListening {} => self.stop_listening(),

            CabinCommand::Ping {} => emit_event(&CabinEvent::Pong {}),

            CabinCommand::Stop {} => {
                emit_event(&CabinEvent::Stopping {});
                return false;
            }
        }

        true
    }

    /// Transcribe and apply one utterance, then let the listener resume.
    async fn handle_utterance(&mut self, utterance: Utterance) {
        let span = info_span!("utterance", id = %utterance.id);

        let result = match &self.stt {
            Some(stt) => stt.transcribe(&utterance.audio).instrument(span.clone()).await,
            None => Err(TranscriptionError::ServiceUnavailable(
                "voice input is not configured".to_string(),
            )),
        };

        let _entered = span.enter();
        if let (Ok(text), Some(advisor)) = (&result, &self.advisor) {
            spawn_advisory(advisor.clone(), text.clone());
        }
        apply_transcription(result, &mut self.session, &self.listener_state);
    }

    fn run_command(&mut self, text: &str) {
        if let Some(advisor) = &self.advisor {
            spawn_advisory(advisor.clone(), text.to_string());
        }
        apply_and_report(&mut self.session, text);
    }

    fn emit_state(&self) {
        emit_event(&CabinEvent::State(self.session.snapshot()));
    }

    fn start_listening(&mut self) {
        if self.stt.is_none() {
            emit_error("Voice input is not configured");
            return;
        }
        if self.listener_state.is_running() {
            debug!(state = %self.listener_state.current(), "Listener already running");
            return;
        }
        // Reap a listener that stopped on its own.
        if let Some(old) = self.listener.take() {
            old.stop();
        }
        match listener::spawn_listener(
            self.input_device.clone(),
            self.listener_state.clone(),
            self.utterance_tx.clone(),
        ) {
            Ok(handle) => self.listener = Some(handle),
            Err(e) => emit_error(&format!("Could not start listening: {}", e)),
        }
    }

    fn stop_listening(&mut self) {
        if let Some(handle) = self.listener.take() {
            info!("Stopping voice listener");
            handle.stop();
        }
    }
}

/// Apply a transcription result and hand the microphone back to the
/// listener. Failures are reported to the display and go no further.
fn apply_transcription(
    result: Result<String, TranscriptionError>,
    session: &mut Session,
    listener_state: &ListenerStateMachine,
) -> Option<CommandOutcome> {
    let outcome = match result {
        Ok(text) => {
            info!(text = %text, "Command recognized");
            emit_event(&CabinEvent::Transcription { text: text.clone() });
            Some(apply_and_report(session, &text))
        }
        Err(TranscriptionError::NoSpeechDetected) => {
            info!("No speech in utterance");
            emit_event(&CabinEvent::NoSpeech {});
            None
        }
        Err(e) => {
            warn!("Transcription failed: {}", e);
            emit_error(&format!("Could not transcribe command: {}", e));
            None
        }
    };

    listener_state.finish_processing();
    outcome
}

fn apply_and_report(session: &mut Session, text: &str) -> CommandOutcome {
    let outcome = session.apply(text);
    emit_event(&CabinEvent::from(outcome.clone()));
    debug!(state = ?session.state(), "Session state");
    outcome
}

/// Throw away utterances captured before the listener was stopped.
fn drain_utterances(rx: &mut mpsc::Receiver<Utterance>) -> usize {
    let mut dropped = 0;
    while let Ok(utterance) = rx.try_recv() {
        debug!(id = %utterance.id, "Dropping utterance from stopped listener");
        dropped += 1;
    }
    dropped
}

/// Fire the advisory LLM call. Its answer is display-only.
fn spawn_advisory(advisor: Arc<Advisor>, command: String) {
    tokio::spawn(async move {
        match advisor.advise(&command).await {
            Ok(text) => {
                info!(command = %command, advice = %text, "Advisor replied");
                emit_event(&CabinEvent::Advisory { command, text });
            }
            Err(e) => warn!("Advisor call failed: {:#}", e),
        }
    });
}
