use async_trait::async_trait;

use crate::ai_generation::config::ModelCandidate;
use crate::ai_generation::{AiResult, CompletionRequest, ProviderResponse};
use crate::error::StudyError;

pub mod openrouter;

/// A chat-completion backend able to answer a request with one named model.
///
/// Any `Err` returned here is treated by the dispatcher as a failure of that
/// single candidate.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        model: &ModelCandidate,
        request: &CompletionRequest,
    ) -> AiResult<ProviderResponse>;
}

pub(crate) fn require_api_key(provider_name: &str, api_key: Option<&str>) -> AiResult<String> {
    match api_key.map(str::trim).filter(|key| !key.is_empty()) {
        Some(value) => Ok(value.to_string()),
        None => Err(StudyError::config(format!(
            "{provider_name} API key is required"
        ))),
    }
}
