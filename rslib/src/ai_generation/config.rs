use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::ai_generation::providers::require_api_key;
use crate::ai_generation::AiResult;
use crate::error::StudyError;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SITE_URL: &str = "https://samanote.com";
const ENV_PREFIX: &str = "OPENROUTER_";

/// Free-tier models, tried in this order.
pub const FREE_MODELS: &[&str] = &[
    "google/gemini-2.0-flash-lite-preview-02-05:free",
    "mistralai/mistral-small-24b-instruct-2501:free",
    "meta-llama/llama-3.3-70b-instruct:free",
    "microsoft/phi-3-mini-128k-instruct:free",
];

/// One backing model. Its priority is its position in
/// [AiGenerationConfig::models].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCandidate(String);

impl ModelCandidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Provider settings, normally read from `OPENROUTER_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiGenerationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub models: Vec<ModelCandidate>,
    pub request_timeout_secs: u64,
    /// Sent as `HTTP-Referer` for provider-side attribution.
    pub site_url: Option<String>,
    /// Sent as `X-Title`.
    pub app_title: Option<String>,
}

impl Default for AiGenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            models: FREE_MODELS.iter().copied().map(ModelCandidate::new).collect(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            site_url: Some(DEFAULT_SITE_URL.to_string()),
            app_title: Some("SamaNote".to_string()),
        }
    }
}

impl AiGenerationConfig {
    pub fn from_env() -> AiResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Like [Self::from_env], but reads from the provided variables.
    pub fn from_vars<I>(vars: I) -> AiResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config: AiGenerationConfig = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(|err| StudyError::config(err.to_string()))?;
        config.ensure_defaults();
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.ensure_defaults();
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(ModelCandidate::new).collect();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self.ensure_defaults();
        self
    }

    /// The provider credential. Its absence is a configuration error.
    pub fn api_key(&self) -> AiResult<String> {
        require_api_key("OpenRouter", self.api_key.as_deref())
    }

    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.models
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn ensure_defaults(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            trimmed.to_string()
        };

        self.models.retain(|model| !model.id().trim().is_empty());
        if self.models.is_empty() {
            self.models = FREE_MODELS.iter().copied().map(ModelCandidate::new).collect();
        }

        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }

        for value in [&mut self.site_url, &mut self.app_title] {
            if value.as_deref().is_some_and(|text| text.trim().is_empty()) {
                *value = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AiGenerationConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.candidates().len(), FREE_MODELS.len());
        assert_eq!(config.candidates()[0].id(), FREE_MODELS[0]);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.site_url.as_deref(), Some(DEFAULT_SITE_URL));
        assert!(matches!(
            config.api_key(),
            Err(StudyError::ConfigError { .. })
        ));
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = AiGenerationConfig::from_vars(vars(&[
            ("OPENROUTER_API_KEY", " sk-test "),
            ("OPENROUTER_BASE_URL", "http://localhost:9000/v1/"),
            ("OPENROUTER_MODELS", "first/model,second/model"),
            ("OPENROUTER_REQUEST_TIMEOUT_SECS", "5"),
            ("OPENROUTER_SITE_URL", ""),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.api_key().unwrap(), "sk-test");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:9000/v1/chat/completions"
        );
        let models: Vec<_> = config.candidates().iter().map(ModelCandidate::id).collect();
        assert_eq!(models, ["first/model", "second/model"]);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.site_url, None);
    }

    #[test]
    fn blank_key_is_missing() {
        let config = AiGenerationConfig::default().with_api_key("   ");
        assert!(matches!(
            config.api_key(),
            Err(StudyError::ConfigError { .. })
        ));
    }

    #[test]
    fn malformed_timeout_is_a_config_error() {
        let result = AiGenerationConfig::from_vars(vars(&[(
            "OPENROUTER_REQUEST_TIMEOUT_SECS",
            "soon",
        )]));
        assert!(matches!(result, Err(StudyError::ConfigError { .. })));
    }
}
