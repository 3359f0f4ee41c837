use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ai_generation::config::{AiGenerationConfig, ModelCandidate};
use crate::ai_generation::{AiResult, ChatMessage, CompletionRequest, ProviderResponse};
use crate::error::NetworkError;

use super::CompletionProvider;

/// Client for an OpenAI-compatible `/chat/completions` endpoint, such as
/// OpenRouter's.
pub struct OpenRouterProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    site_url: Option<String>,
    app_title: Option<String>,
}

impl OpenRouterProvider {
    pub fn new(config: &AiGenerationConfig) -> AiResult<Self> {
        let api_key = config.api_key()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.chat_completions_url(),
            api_key,
            site_url: config.site_url.clone(),
            app_title: config.app_title.clone(),
        })
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(
        &self,
        model: &ModelCandidate,
        request: &CompletionRequest,
    ) -> AiResult<ProviderResponse> {
        let body = OpenRouterRequest {
            model: model.id(),
            messages: request.messages(),
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
            response_format: request.json_mode().then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(site_url) = &self.site_url {
            builder = builder.header("HTTP-Referer", site_url);
        }
        if let Some(app_title) = &self.app_title {
            builder = builder.header("X-Title", app_title);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NetworkError::status(status.as_u16(), &text).into());
        }

        let bytes = response.bytes().await?;
        let parsed: OpenRouterResponse = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => crate::invalid_input!(err, "OpenRouter response was not valid JSON"),
        };

        if let Some(error) = parsed.error {
            let message = error
                .message
                .unwrap_or_else(|| "OpenRouter API returned an error".to_string());
            crate::invalid_input!("OpenRouter API error: {message}");
        }

        let raw_output = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        if raw_output.trim().is_empty() {
            crate::invalid_input!("OpenRouter did not return any content");
        }

        Ok(ProviderResponse {
            raw_output,
            model: Some(parsed.model.unwrap_or_else(|| model.id().to_string())),
            tokens_used: parsed
                .usage
                .and_then(|usage| usage.total_tokens.map(|value| value as u32)),
        })
    }
}

#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenRouterChoice>,
    #[serde(default)]
    usage: Option<OpenRouterUsage>,
    #[serde(default)]
    error: Option<OpenRouterError>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: Option<OpenRouterMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterUsage {
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterError {
    message: Option<String>,
}
