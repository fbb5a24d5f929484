use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::CompletionService;

/// Ollama `/api/generate` client, sampling at temperature 0.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/v1")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}

#[async_trait]
impl CompletionService for OllamaClient {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let request_body = GenerateRequest::new(&self.model, prompt);

        let response = self
            .http
            .post(self.generate_endpoint())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::LanguageModel(format!("failed to call Ollama: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::LanguageModel(format!(
                "Ollama responded with {status}: {body}"
            )));
        }

        let payload: GenerateResponse = response.json().await.map_err(|err| {
            AppError::LanguageModel(format!("failed to parse Ollama response: {err}"))
        })?;

        debug!(
            model = %self.model,
            eval_count = payload.eval_count.unwrap_or_default(),
            "completion received"
        );

        Ok(payload.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

impl<'a> GenerateRequest<'a> {
    fn new(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        }
    }
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}
