//! Ollama REST adapter for text generation.

use std::time::Duration;

use async_trait::async_trait;
use nerostack_application::{GenerationRequest, TextGenerationProvider};
use nerostack_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const TAGS_TIMEOUT: Duration = Duration::from_secs(10);

/// Sampling options sent with every generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Maximum generated tokens.
    pub num_predict: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            num_predict: 2048,
        }
    }
}

/// Generates text through a local Ollama server.
pub struct OllamaTextGenerationProvider {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
}

impl OllamaTextGenerationProvider {
    /// Creates a provider for the given base URL and model name.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            options: GenerationOptions::default(),
        }
    }

    async fn fetch_tags(&self) -> AppResult<TagsResponse> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|error| {
                AppError::ServiceUnavailable(format!(
                    "text generation provider unreachable: {error}"
                ))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ServiceUnavailable(format!(
                "text generation provider returned {} for model listing",
                response.status()
            )));
        }

        response.json::<TagsResponse>().await.map_err(|error| {
            AppError::ServiceUnavailable(format!(
                "text generation provider returned an unreadable model list: {error}"
            ))
        })
    }
}

#[derive(Debug, Serialize)]
struct GeneratePayload<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerationOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

fn generate_payload<'a>(
    model: &'a str,
    request: &'a GenerationRequest,
    options: GenerationOptions,
) -> GeneratePayload<'a> {
    GeneratePayload {
        model,
        prompt: request.prompt.as_str(),
        stream: false,
        options,
        system: request.system_prompt.as_deref(),
    }
}

fn model_names(tags: TagsResponse) -> Vec<String> {
    tags.models.into_iter().map(|model| model.name).collect()
}

#[async_trait]
impl TextGenerationProvider for OllamaTextGenerationProvider {
    async fn generate(&self, request: GenerationRequest) -> AppResult<String> {
        let payload = generate_payload(self.model.as_str(), &request, self.options);

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                AppError::ServiceUnavailable(format!("text generation request failed: {error}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            tracing::warn!(%status, model = %self.model, "text generation provider rejected request");
            return Err(AppError::ServiceUnavailable(format!(
                "text generation provider returned {status}: {body}"
            )));
        }

        let generated = response.json::<GenerateResponse>().await.map_err(|error| {
            AppError::ServiceUnavailable(format!(
                "text generation provider returned an unreadable payload: {error}"
            ))
        })?;

        Ok(generated.response.trim().to_owned())
    }

    async fn is_available(&self) -> bool {
        match self.fetch_tags().await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(%error, "text generation provider is not available");
                false
            }
        }
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        self.fetch_tags().await.map(model_names)
    }

    fn model_name(&self) -> &str {
        self.model.as_str()
    }
}

#[cfg(test)]
mod tests {
    use nerostack_application::GenerationRequest;

    use super::{GenerationOptions, TagsResponse, generate_payload, model_names};

    #[test]
    fn payload_disables_streaming_and_omits_missing_system_prompt() {
        let request = GenerationRequest {
            prompt: "Summarize".to_owned(),
            system_prompt: None,
        };
        let payload = generate_payload("llama3.2", &request, GenerationOptions::default());
        let value = serde_json::to_value(&payload).unwrap_or_default();

        assert_eq!(value["model"], "llama3.2");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 2048);
        assert!(value.get("system").is_none());
    }

    #[test]
    fn payload_carries_system_prompt() {
        let request = GenerationRequest {
            prompt: "Summarize".to_owned(),
            system_prompt: Some("You are an analyst.".to_owned()),
        };
        let payload = generate_payload("llama3.2", &request, GenerationOptions::default());
        let value = serde_json::to_value(&payload).unwrap_or_default();

        assert_eq!(value["system"], "You are an analyst.");
    }

    #[test]
    fn model_tags_are_flattened_to_names() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models": [{"name": "llama3.2:latest", "size": 1}, {"name": "mistral:7b"}]}"#,
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            model_names(tags),
            vec!["llama3.2:latest".to_owned(), "mistral:7b".to_owned()]
        );
    }
}
