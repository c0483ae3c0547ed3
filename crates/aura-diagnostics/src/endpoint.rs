//! Probe of the local OpenAI-compatible model endpoint.

use std::time::Instant;

use aura_config::ModelConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ProbeError;

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointReport {
    pub base_url: String,
    pub models: Vec<String>,
    pub selected_model: Option<String>,
    pub list_ms: u64,
    pub completion_ms: Option<u64>,
    pub completion_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ModelEndpointProbe {
    client: reqwest::Client,
    base_url: String,
    model: Option<String>,
    api_key: Option<String>,
}

impl ModelEndpointProbe {
    pub fn new(config: &ModelConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List models, then ask the selected one for a single token.
    ///
    /// An unreachable `/models` is an error; a failed completion is reported
    /// in the returned [`EndpointReport`].
    pub async fn probe(&self) -> Result<EndpointReport, ProbeError> {
        let started = Instant::now();
        let models = self.list_models().await?;
        let list_ms = started.elapsed().as_millis() as u64;
        debug!(count = models.len(), list_ms, "listed models");

        let selected_model = self.model.clone().or_else(|| models.first().cloned());
        let mut report = EndpointReport {
            base_url: self.base_url.clone(),
            models,
            selected_model: selected_model.clone(),
            list_ms,
            completion_ms: None,
            completion_ok: false,
            error: None,
        };

        let Some(model) = selected_model else {
            report.error = Some("endpoint lists no models and none is configured".to_string());
            warn!(base_url = %self.base_url, "no model to probe");
            return Ok(report);
        };

        let started = Instant::now();
        match self.complete_one_token(&model).await {
            Ok(()) => report.completion_ok = true,
            Err(e) => report.error = Some(e.to_string()),
        }
        report.completion_ms = Some(started.elapsed().as_millis() as u64);

        info!(
            base_url = %self.base_url,
            model = %model,
            completion_ok = report.completion_ok,
            completion_ms = report.completion_ms,
            "model endpoint probed"
        );
        Ok(report)
    }

    async fn list_models(&self) -> Result<Vec<String>, ProbeError> {
        let response = self
            .authorized(self.client.get(format!("{}/models", self.base_url)))
            .send()
            .await?;
        let response = check_status(response).await?;
        let list: ModelList = response
            .json()
            .await
            .map_err(|e| ProbeError::UnexpectedResponse(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    async fn complete_one_token(&self, model: &str) -> Result<(), ProbeError> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: "Reply with OK.",
            }],
            max_tokens: 1,
            temperature: 0.0,
        };
        let response = self
            .authorized(self.client.post(format!("{}/chat/completions", self.base_url)))
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProbeError::UnexpectedResponse(e.to_string()))?;
        if body.choices.is_empty() {
            return Err(ProbeError::UnexpectedResponse("completion has no choices".to_string()));
        }
        Ok(())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProbeError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ProbeError::Status { status, body })
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
