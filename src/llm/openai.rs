use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::error::CompletionError;
use super::provider::CompletionClient;
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::LlmSettings;

/// Longest upstream error body carried into a [`CompletionError`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for an OpenAI-compatible HTTP API (`/v1/chat/completions`,
/// `/v1/embeddings`).
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    completion_model: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    client: Client,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, completion_model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            completion_model: completion_model.into(),
            temperature: None,
            max_tokens: None,
            client: Client::new(),
        }
    }

    /// Builds a client from settings; `None` when no API key is configured.
    pub fn from_settings(settings: &LlmSettings) -> Option<Self> {
        let api_key = settings.api_key()?;

        let mut client = Self::new(&settings.base_url, api_key, &settings.completion_model);
        client.temperature = settings.temperature;
        client.max_tokens = settings.max_tokens;
        Some(client)
    }

    pub fn completion_model(&self) -> &str {
        &self.completion_model
    }

    pub async fn chat(&self, mut request: ChatRequest) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        request.temperature = request.temperature.or(self.temperature);
        request.max_tokens = request.max_tokens.or(self.max_tokens);
        let body = request.to_body(&self.completion_model);

        let res = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CompletionError::transport)?;
        let res = ensure_success(res).await?;

        let payload: Value = res.json().await.map_err(|e| CompletionError::Malformed(e.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CompletionError::Malformed("missing choices[0].message.content".to_string()))
    }

    pub async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, CompletionError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CompletionError::transport)?;
        let res = ensure_success(res).await?;

        let payload: Value = res.json().await.map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let data = payload["data"]
            .as_array()
            .ok_or_else(|| CompletionError::Malformed("missing data array".to_string()))?;

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let vals = item["embedding"]
                .as_array()
                .ok_or_else(|| CompletionError::Malformed("missing embedding array".to_string()))?;
            let vec: Vec<f32> = vals.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect();
            embeddings.push(vec);
        }

        if embeddings.len() != inputs.len() {
            return Err(CompletionError::Malformed(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }
}

async fn ensure_success(res: Response) -> Result<Response, CompletionError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    Err(CompletionError::Status {
        status: status.as_u16(),
        body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system_message: &str, user_message: &str) -> Result<String, CompletionError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(system_message),
            ChatMessage::user(user_message),
        ]);
        self.chat(request).await
    }
}
