use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use crate::completion::{CompletionParams, CompletionProvider};
use crate::{PgTextQueryError, Result};

pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Client for the OpenAI completion api, or anything that speaks the same protocol.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Uses the `OPENAI_API_KEY` environment variable, if `api_key` isn't given.
    pub fn from_key_or_env(api_key: Option<&str>, base_url: &str) -> Result<Self> {
        match api_key {
            Some(key) if !key.is_empty() => Ok(Self::new(key, base_url)),
            _ => {
                let key = std::env::var(API_KEY_ENV_VAR)
                    .map_err(|_| PgTextQueryError::MissingEnvVar(API_KEY_ENV_VAR.to_string()))?;
                Ok(Self::new(&key, base_url))
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, body: serde_json::Map<String, Value>) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

pub(crate) fn completion_request_body(prompt: &str, params: &CompletionParams) -> serde_json::Map<String, Value> {
    let mut body = params.clone().into_body();
    body.insert("prompt".to_string(), json!(prompt));
    body
}

pub(crate) fn chat_request_body(
    system: Option<&str>,
    user: &str,
    params: &CompletionParams,
) -> serde_json::Map<String, Value> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": user}));

    let mut body = params.clone().into_body();
    body.insert("messages".to_string(), Value::Array(messages));
    body
}

pub fn parse_completion_response(json: &Value) -> Result<String> {
    json.pointer("/choices/0/text")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| PgTextQueryError::InvalidCompletionResponse("missing choices[0].text".to_string()))
}

pub fn parse_chat_response(json: &Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            PgTextQueryError::InvalidCompletionResponse("missing choices[0].message.content".to_string())
        })
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    #[instrument(skip_all)]
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        debug!(prompt_length = prompt.len(), "requesting completion");
        let json = self.post("completions", completion_request_body(prompt, params)).await?;
        parse_completion_response(&json)
    }

    #[instrument(skip_all)]
    async fn chat(&self, system: Option<&str>, user: &str, params: &CompletionParams) -> Result<String> {
        debug!(prompt_length = user.len(), has_system = system.is_some(), "requesting chat completion");
        let json = self.post("chat/completions", chat_request_body(system, user, params)).await?;
        parse_chat_response(&json)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
