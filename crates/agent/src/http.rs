use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use wegroup_core::config::{AiConfig, AiProvider};

use crate::llm::{ChatCompletionClient, ChatRequest};

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Failed attempts are retried up to `max_retries` additional times before
/// the last error is surfaced to the caller.
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    max_retries: u32,
}

impl HttpChatClient {
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("build ai http client")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string());

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
        });
        if request.json_only {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let mut outbound = self.http.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.api_key {
            outbound = outbound.bearer_auth(api_key.expose_secret());
        }

        let response = outbound.send().await.context("ai completion request failed")?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("ai completion endpoint returned {status}: {detail}"));
        }

        let completion: ChatCompletionResponse =
            response.json().await.context("ai completion response was not valid JSON")?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("ai completion response contained no choices"))
    }
}

#[async_trait]
impl ChatCompletionClient for HttpChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.send_once(request).await {
                Ok(content) => return Ok(content),
                Err(error) => {
                    warn!(
                        event_name = "agent.completion.attempt_failed",
                        attempt,
                        max_retries = self.max_retries,
                        error = %error,
                        "ai completion attempt failed"
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("ai completion failed with no attempts")))
    }
}

fn default_base_url(provider: AiProvider) -> &'static str {
    match provider {
        AiProvider::OpenAi => "https://api.openai.com",
        AiProvider::Anthropic => "https://api.anthropic.com",
        AiProvider::Ollama => "http://localhost:11434",
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
