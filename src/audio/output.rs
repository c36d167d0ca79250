//! Track playback via rodio.
//!
//! Decodes audio files and plays them on the default output device. Each
//! `play` opens a fresh sink, so starting a track replaces the previous one.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{info, warn};

/// Audio output collaborator used by the playback controller.
pub trait AudioOutput {
    /// Start playing the file at `path`. Returns once playback has started.
    fn play(&mut self, path: &Path) -> anyhow::Result<()>;

    /// Stop whatever is playing. A no-op when idle.
    fn stop(&mut self);

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Plays decoded files through the default output device.
pub struct RodioOutput {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioOutput {
    /// Open the default audio output device.
    pub fn new() -> anyhow::Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| anyhow::anyhow!("Failed to open audio output: {}", e))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self, path: &Path) -> anyhow::Result<()> {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("Failed to decode {}: {}", path.display(), e))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| anyhow::anyhow!("Failed to create audio sink: {}", e))?;
        sink.append(source);

        // Dropping the previous sink stops it.
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn name(&self) -> &'static str {
        "rodio"
    }
}

/// Stand-in used when no output device is available.
#[derive(Debug, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn play(&mut self, path: &Path) -> anyhow::Result<()> {
        info!(path = %path.display(), "No audio output, pretending to play");
        Ok(())
    }

    fn stop(&mut self) {}

    fn name(&self) -> &'static str {
        "silent"
    }
}

/// Open the default output, falling back to [`SilentOutput`].
pub fn open_default_output() -> Box<dyn AudioOutput> {
    match RodioOutput::new() {
        Ok(output) => Box::new(output),
        Err(e) => {
            warn!("{}; track playback will be silent", e);
            Box::new(SilentOutput)
        }
    }
}
