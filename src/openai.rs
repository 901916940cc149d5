//! OpenAI Responses API client implementing [`CompletionService`].
//!
//! Sends one `POST /responses` request per completion with the
//! instructions as the system message and the context as the user
//! message. Requires the `OPENAI_API_KEY` environment variable.
//!
//! No retries: a 429 or 5xx is reported like any other failure and the
//! scheduler's next run tries again.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use journal_mentor_core::models::CompletionRequest;
use journal_mentor_core::store::CompletionService;

use crate::config::OpenAIConfig;

/// Client for the OpenAI Responses API.
pub struct OpenAIClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenAIClient {
    /// Create a client, reading the key from `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not set.
    pub fn new(config: &OpenAIConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Request body for `POST /responses`.
pub fn request_json(request: &CompletionRequest) -> Value {
    json!({
        "model": request.model,
        "input": [
            { "role": "system", "content": request.instructions },
            { "role": "user", "content": request.input },
        ],
        "temperature": request.temperature,
    })
}

/// Extract the generated text from a Responses API reply.
///
/// Prefers the aggregated `output_text` field; otherwise concatenates every
/// `output_text` content item of every output message.
pub fn parse_output_text(json: &Value) -> Result<String> {
    if let Some(text) = json.get("output_text").and_then(|t| t.as_str()) {
        return Ok(text.to_string());
    }

    let output = json
        .get("output")
        .and_then(|o| o.as_array())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing output array"))?;

    Ok(output
        .iter()
        .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
        .flatten()
        .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect())
}

#[async_trait]
impl CompletionService for OpenAIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/responses", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_json(request))
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_output_text(&json)
    }
}
