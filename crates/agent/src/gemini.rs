use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use bannerkit_core::config::LlmConfig;

use crate::llm::{GenerateRequest, LlmClient};

/// Google Gemini `generateContent` client.
///
/// Transport failures, non-2xx statuses, and unexpected response shapes all
/// surface as `Err`; the orchestrator collapses them into its fallback path.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("gemini api key is not configured"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building gemini http client")?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

fn request_body(request: &GenerateRequest) -> Value {
    let mut generation_config = json!({ "temperature": request.temperature });
    if request.json_mode {
        generation_config["responseMimeType"] = json!("application/json");
    }

    json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "systemInstruction": { "parts": [{ "text": request.system }] },
        "generationConfig": generation_config,
    })
}

fn extract_text(response: &Value) -> Result<String> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("gemini response carried no candidate text"))
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request_body(&request))
            .send()
            .await
            .context("sending gemini request")?
            .error_for_status()
            .context("gemini returned an error status")?;

        let payload: Value = response.json().await.context("decoding gemini response")?;
        extract_text(&payload)
    }
}
