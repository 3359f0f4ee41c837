use tracing::{debug, error, info, warn};

use crate::ai_generation::config::{AiGenerationConfig, ModelCandidate};
use crate::ai_generation::providers::openrouter::OpenRouterProvider;
use crate::ai_generation::providers::CompletionProvider;
use crate::ai_generation::{AiResult, CompletionRequest};
use crate::error::StudyError;

/// Sends completion requests to a list of model candidates, in order, until
/// one of them answers.
///
/// Each call starts again from the first candidate; no health state is kept
/// between calls.
pub struct CompletionDispatcher {
    candidates: Vec<ModelCandidate>,
    provider: Box<dyn CompletionProvider>,
}

impl CompletionDispatcher {
    /// Fails with a configuration error if no API key is configured.
    pub fn new(config: &AiGenerationConfig) -> AiResult<Self> {
        let provider = OpenRouterProvider::new(config)?;
        Ok(Self::with_provider(
            config.candidates().to_vec(),
            Box::new(provider),
        ))
    }

    pub fn with_provider(
        candidates: Vec<ModelCandidate>,
        provider: Box<dyn CompletionProvider>,
    ) -> Self {
        Self {
            candidates,
            provider,
        }
    }

    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    /// Return the text of the first candidate that produces a usable
    /// completion. If all fail, the last candidate's error is reported in a
    /// [StudyError::DispatchFailed]; earlier errors are logged.
    pub async fn generate_completion(&self, request: &CompletionRequest) -> AiResult<String> {
        let mut last_error = None;

        for (index, candidate) in self.candidates.iter().enumerate() {
            let attempt = index + 1;
            debug!(model = candidate.id(), attempt, "requesting completion");

            match self.provider.complete(candidate, request).await {
                Ok(response) => {
                    info!(
                        model = candidate.id(),
                        attempt,
                        tokens = ?response.tokens_used,
                        "completion succeeded"
                    );
                    return Ok(response.raw_output);
                }
                Err(err) => {
                    warn!(model = candidate.id(), attempt, error = %err, "model candidate failed");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) => {
                let attempts = self.candidates.len();
                error!(attempts, error = %err, "all model candidates failed");
                Err(StudyError::DispatchFailed {
                    attempts,
                    last_error: err.to_string(),
                })
            }
            None => Err(StudyError::config("no model candidates configured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ai_generation::ProviderResponse;

    fn success(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    async fn mount_for_model(server: &MockServer, model: &str, response: ResponseTemplate, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "model": model })))
            .respond_with(response)
            .expect(calls)
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer, models: &[&str]) -> AiGenerationConfig {
        AiGenerationConfig::default()
            .with_api_key("sk-test")
            .with_base_url(server.uri())
            .with_models(models.iter().copied())
    }

    #[tokio::test]
    async fn falls_back_until_a_candidate_answers() {
        let server = MockServer::start().await;
        mount_for_model(&server, "m1", ResponseTemplate::new(500), 1).await;
        mount_for_model(&server, "m2", ResponseTemplate::new(503), 1).await;
        mount_for_model(&server, "m3", success("from m3"), 1).await;
        mount_for_model(&server, "m4", success("from m4"), 0).await;

        let dispatcher =
            CompletionDispatcher::new(&config_for(&server, &["m1", "m2", "m3", "m4"])).unwrap();
        let text = dispatcher
            .generate_completion(&CompletionRequest::from_prompt("hi"))
            .await
            .unwrap();
        assert_eq!(text, "from m3");
    }

    #[tokio::test]
    async fn malformed_payload_counts_as_candidate_failure() {
        let server = MockServer::start().await;
        mount_for_model(
            &server,
            "m1",
            ResponseTemplate::new(200).set_body_string("<html>gateway</html>"),
            1,
        )
        .await;
        mount_for_model(
            &server,
            "m2",
            ResponseTemplate::new(200).set_body_json(json!({"choices": [{}]})),
            1,
        )
        .await;
        mount_for_model(&server, "m3", success("finally"), 1).await;

        let dispatcher =
            CompletionDispatcher::new(&config_for(&server, &["m1", "m2", "m3"])).unwrap();
        let text = dispatcher
            .generate_completion(&CompletionRequest::from_prompt("hi"))
            .await
            .unwrap();
        assert_eq!(text, "finally");
    }

    #[tokio::test]
    async fn reports_last_error_when_all_fail() {
        let server = MockServer::start().await;
        mount_for_model(&server, "m1", ResponseTemplate::new(500), 1).await;
        mount_for_model(
            &server,
            "m2",
            ResponseTemplate::new(429).set_body_string("quota exhausted"),
            1,
        )
        .await;

        let dispatcher = CompletionDispatcher::new(&config_for(&server, &["m1", "m2"])).unwrap();
        let err = dispatcher
            .generate_completion(&CompletionRequest::from_prompt("hi"))
            .await
            .unwrap_err();

        match err {
            StudyError::DispatchFailed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("429"), "{last_error}");
                assert!(last_error.contains("quota exhausted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credential_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(success("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let config = AiGenerationConfig::default().with_base_url(server.uri());
        let err = CompletionDispatcher::new(&config).err().unwrap();
        assert!(matches!(err, StudyError::ConfigError { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hung_candidate_is_skipped_after_timeout() {
        let server = MockServer::start().await;
        mount_for_model(
            &server,
            "slow",
            success("too late").set_delay(std::time::Duration::from_secs(5)),
            1,
        )
        .await;
        mount_for_model(&server, "fast", success("in time"), 1).await;

        let config = config_for(&server, &["slow", "fast"]).with_request_timeout_secs(1);
        let dispatcher = CompletionDispatcher::new(&config).unwrap();
        let text = dispatcher
            .generate_completion(&CompletionRequest::from_prompt("hi"))
            .await
            .unwrap();
        assert_eq!(text, "in time");
    }

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        answer_on: usize,
    }

    #[async_trait::async_trait]
    impl CompletionProvider for CountingProvider {
        async fn complete(
            &self,
            model: &ModelCandidate,
            _request: &CompletionRequest,
        ) -> AiResult<ProviderResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.answer_on {
                Ok(ProviderResponse {
                    raw_output: format!("answered by {}", model.id()),
                    model: Some(model.id().to_string()),
                    tokens_used: None,
                })
            } else {
                crate::invalid_input!("candidate {} unavailable", model.id());
            }
        }
    }

    #[tokio::test]
    async fn every_call_starts_from_the_first_candidate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = CompletionDispatcher::with_provider(
            vec![ModelCandidate::new("a"), ModelCandidate::new("b")],
            Box::new(CountingProvider {
                calls: calls.clone(),
                answer_on: 2,
            }),
        );
        let request = CompletionRequest::from_prompt("hi");

        assert_eq!(
            dispatcher.generate_completion(&request).await.unwrap(),
            "answered by b"
        );
        // third call overall goes to "a" again, and fails; "b" fails too
        let err = dispatcher.generate_completion(&request).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(err.to_string().contains("candidate b unavailable"));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_a_config_error() {
        let dispatcher = CompletionDispatcher::with_provider(
            Vec::new(),
            Box::new(CountingProvider {
                calls: Arc::new(AtomicUsize::new(0)),
                answer_on: 1,
            }),
        );
        let err = dispatcher
            .generate_completion(&CompletionRequest::from_prompt("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::ConfigError { .. }));
    }
}
