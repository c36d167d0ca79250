//! Speech-to-text adapters.
//!
//! Transcription is delegated to a hosted service:
//! - OpenAI Whisper API
//! - Custom user-configured, OpenAI-compatible endpoint

pub mod cloud;

use std::time::Duration;

use thiserror::Error;

use crate::config::SttSettings;

/// Environment fallback for the OpenAI key.
const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Why an utterance produced no command text. Never fatal to the loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("no speech detected")]
    NoSpeechDetected,
    #[error("speech service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(e: reqwest::Error) -> Self {
        Self::ServiceUnavailable(e.to_string())
    }
}

/// Common trait for all STT engines.
#[allow(async_fn_in_trait)]
pub trait SttEngine: Send + Sync {
    /// Transcribe 16 kHz mono f32 audio to text.
    async fn transcribe(&self, audio: &[f32]) -> Result<String, TranscriptionError>;
}

/// Enum-dispatch wrapper over all STT backends.
pub enum SttAdapter {
    OpenAi(cloud::OpenAiStt),
    Custom(cloud::CustomApiStt),
}

impl SttAdapter {
    pub async fn transcribe(&self, audio: &[f32]) -> Result<String, TranscriptionError> {
        match self {
            Self::OpenAi(e) => e.transcribe(audio).await,
            Self::Custom(e) => e.transcribe(audio).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-cloud",
            Self::Custom(_) => "custom-cloud",
        }
    }
}

/// Create an STT engine from config.
///
/// `settings.adapter` is one of: "openai-cloud", "custom-cloud".
pub fn create_stt_engine(settings: &SttSettings) -> anyhow::Result<SttAdapter> {
    let model = settings.model.as_deref().unwrap_or(cloud::DEFAULT_MODEL);
    let timeout = Duration::from_secs(settings.timeout_secs);
    match settings.adapter.as_str() {
        "openai-cloud" => {
            let key = settings
                .api_key
                .clone()
                .or_else(|| std::env::var(OPENAI_KEY_ENV).ok())
                .ok_or_else(|| anyhow::anyhow!("OpenAI STT requires an API key"))?;
            Ok(SttAdapter::OpenAi(cloud::OpenAiStt::new(&key, model, timeout)?))
        }
        "custom-cloud" => {
            let url = settings
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Custom STT requires an endpoint URL"))?;
            Ok(SttAdapter::Custom(cloud::CustomApiStt::new(
                url,
                settings.api_key.clone(),
                model,
                timeout,
            )?))
        }
        other => anyhow::bail!("Unknown STT adapter: {}", other),
    }
}
