//! Hosted LLM advisory call.
//!
//! Each command is also sent to an OpenAI-compatible chat-completions
//! endpoint. The reply is only logged and forwarded to the display; command
//! handling never waits on it or reads it.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::AdvisorSettings;

/// Environment fallback for the advisor key.
const API_KEY_ENV: &str = "TOGETHER_API_KEY";

pub struct Advisor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
}

impl Advisor {
    /// Build the advisor, or `None` when disabled or no key is available.
    pub fn from_settings(settings: &AdvisorSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())?;

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to create advisor HTTP client: {}", e);
                return None;
            }
        };

        info!(model = %settings.model, endpoint = %settings.endpoint, "LLM advisor enabled");
        Some(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            system_prompt: settings.system_prompt.clone(),
        })
    }

    fn request_body(&self, command: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": self.system_prompt},
                {"role": "user", "content": command},
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        })
    }

    /// Ask the model about `command` and return its free-form answer.
    pub async fn advise(&self, command: &str) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!(url = %url, "Requesting advisory completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(command))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Advisor API error {}: {}", status, body);
        }

        let json: serde_json::Value = resp.json().await?;
        completion_text(&json)
    }
}

fn completion_text(json: &serde_json::Value) -> anyhow::Result<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("Advisor reply has no message content"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ADVISOR_PROMPT;

    fn enabled() -> AdvisorSettings {
        AdvisorSettings {
            enabled: true,
            api_key: Some("key".into()),
            endpoint: "https://llm.example/v1/".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_by_default() {
        assert!(Advisor::from_settings(&AdvisorSettings::default()).is_none());
    }

    #[test]
    fn test_blank_key_disables() {
        let settings = AdvisorSettings {
            api_key: Some("  ".into()),
            ..enabled()
        };
        assert!(Advisor::from_settings(&settings).is_none());
    }

    #[test]
    fn test_request_body() {
        let advisor = Advisor::from_settings(&enabled()).unwrap();
        assert_eq!(advisor.endpoint, "https://llm.example/v1");

        let body = advisor.request_body("play first song");
        assert_eq!(body["model"], "meta-llama/Llama-3.2-3B-Instruct-Turbo");
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], DEFAULT_ADVISOR_PROMPT);
        assert_eq!(body["messages"][1]["content"], "play first song");
    }

    #[tokio::test]
    async fn test_stalled_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let settings = AdvisorSettings {
            endpoint: format!("http://{}/v1", addr),
            timeout_secs: 1,
            ..enabled()
        };
        let advisor = Advisor::from_settings(&settings).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), advisor.advise("stop music"))
            .await
            .expect("advisor call should give up on its own");
        assert!(result.is_err());

        server.abort();
    }

    #[test]
    fn test_completion_text() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": " Sure! "}}]});
        assert_eq!(completion_text(&reply).unwrap(), "Sure!");
        assert!(completion_text(&json!({"choices": []})).is_err());
    }
}
