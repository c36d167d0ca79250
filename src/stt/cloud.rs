//! Cloud STT adapters (OpenAI Whisper API, custom endpoint).

use std::time::Duration;

use anyhow::Context;
use reqwest::multipart;
use tracing::debug;

use super::{SttEngine, TranscriptionError};
use crate::audio::capture::TARGET_SAMPLE_RATE;

pub const DEFAULT_MODEL: &str = "whisper-1";

const OPENAI_TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// HTTP client whose requests fail with a timeout error after `timeout`.
pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Encode mono f32 samples as a 16-bit PCM WAV file.
pub(crate) fn encode_wav(audio: &[f32], sample_rate: u32) -> Vec<u8> {
    const BYTES_PER_SAMPLE: u16 = 2;
    const CHANNELS: u16 = 1;

    let data_size = audio.len() as u32 * BYTES_PER_SAMPLE as u32;
    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&CHANNELS.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * CHANNELS as u32 * BYTES_PER_SAMPLE as u32).to_le_bytes());
    buf.extend_from_slice(&(CHANNELS * BYTES_PER_SAMPLE).to_le_bytes());
    buf.extend_from_slice(&(BYTES_PER_SAMPLE * 8).to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in audio {
        let pcm = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&pcm.to_le_bytes());
    }

    buf
}

/// Upload a WAV form and pull `text` out of the JSON reply.
async fn send_transcription(
    req: reqwest::RequestBuilder,
    audio: &[f32],
    model: &str,
) -> Result<String, TranscriptionError> {
    let wav = encode_wav(audio, TARGET_SAMPLE_RATE);
    debug!(bytes = wav.len(), model, "Uploading utterance for transcription");

    let file_part = multipart::Part::bytes(wav)
        .file_name("utterance.wav")
        .mime_str("audio/wav")?;
    let form = multipart::Form::new()
        .text("model", model.to_string())
        .part("file", file_part);

    let resp = req.multipart(form).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TranscriptionError::ServiceUnavailable(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    let json: serde_json::Value = resp.json().await?;
    transcript_from_json(&json)
}

fn transcript_from_json(json: &serde_json::Value) -> Result<String, TranscriptionError> {
    let text = json["text"].as_str().unwrap_or("").trim();
    if text.is_empty() {
        return Err(TranscriptionError::NoSpeechDetected);
    }
    Ok(text.to_string())
}

// ---------------------------------------------------------------------------
// OpenAI Whisper API
// ---------------------------------------------------------------------------

pub struct OpenAiStt {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiStt {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: http_client(timeout)?,
        })
    }
}

impl SttEngine for OpenAiStt {
    async fn transcribe(&self, audio: &[f32]) -> Result<String, TranscriptionError> {
        let req = self
            .client
            .post(OPENAI_TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key);
        send_transcription(req, audio, &self.model).await
    }
}

// ---------------------------------------------------------------------------
// Custom API endpoint
// ---------------------------------------------------------------------------

/// User-configured endpoint speaking the OpenAI transcription form.
pub struct CustomApiStt {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl CustomApiStt {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key,
            model: model.to_string(),
            client: http_client(timeout)?,
        })
    }
}

impl SttEngine for CustomApiStt {
    async fn transcribe(&self, audio: &[f32]) -> Result<String, TranscriptionError> {
        debug!(endpoint = %self.endpoint, "Using custom STT endpoint");
        let mut req = self.client.post(&self.endpoint);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        send_transcription(req, audio, &self.model).await
    }
}
