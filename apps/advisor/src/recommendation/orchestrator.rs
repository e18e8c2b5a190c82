//! Recommendation orchestrator: sequential model failover with template fallback.
//!
//! Per request the orchestrator walks a small state machine:
//!
//! ```text
//! Idle ──(no credential)──────────────────────────────► ConfigurationMissing
//!  │
//!  └─► PromptBuilt ─► Calling(0) ─fail─► Calling(1) ─ … ─fail─► Exhausted
//!                        │                  │
//!                        └──────ok──────────┴──────────────────► Succeeded
//! ```
//!
//! Exactly one upstream call is in flight at a time. Each call is bounded by the
//! configured timeout; a timed-out call is dropped (cancelled) before the next
//! model is tried. No model is retried.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{CompletionRequest, LlmError, ModelProvider};
use crate::models::profile::UserProfile;
use crate::models::recommendation::{DegradationReason, MatchedProduct, RecommendationResult};
use crate::recommendation::prompts::{
    build_prompt, ADVISOR_SYSTEM_PROMPT, CONFIGURATION_MISSING_NOTICE, PROVIDERS_EXHAUSTED_NOTICE,
};
use crate::recommendation::template;

pub const DEFAULT_MODELS: [&str; 4] = [
    "google/gemma-3-27b-it",
    "meta-llama/Meta-Llama-3-8B-Instruct",
    "mistralai/Mistral-7B-Instruct-v0.2",
    "google/gemma-2-9b-it",
];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether an upstream provider is usable. Decided once at startup.
#[derive(Clone)]
pub enum Upstream {
    Configured(Arc<dyn ModelProvider>),
    /// No credential was supplied; every request takes the template path.
    ConfigurationMissing,
}

/// A single model's failure, kept for logging and error reporting.
#[derive(Debug)]
pub struct ModelFailure {
    pub model: String,
    pub error: LlmError,
}

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("API key is not configured")]
    ConfigurationMissing,

    #[error("all {} configured models failed", .attempts.len())]
    ProvidersExhausted { attempts: Vec<ModelFailure> },
}

impl RecommendationError {
    pub fn degradation_reason(&self) -> DegradationReason {
        match self {
            RecommendationError::ConfigurationMissing => DegradationReason::ConfigurationMissing,
            RecommendationError::ProvidersExhausted { .. } => DegradationReason::ProvidersExhausted,
        }
    }
}

/// Text produced by the first model that answered.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    /// For logging only; not part of the recommendation contract.
    pub model: String,
    pub text: String,
}

enum FailoverState<'a> {
    Idle,
    PromptBuilt {
        provider: &'a dyn ModelProvider,
        request: CompletionRequest,
    },
    Calling {
        provider: &'a dyn ModelProvider,
        request: CompletionRequest,
        index: usize,
    },
    Succeeded(GeneratedText),
    Exhausted,
}

pub struct RecommendationOrchestrator {
    upstream: Upstream,
    models: Vec<String>,
    timeout: Duration,
}

impl RecommendationOrchestrator {
    pub fn new(upstream: Upstream, models: Vec<String>, timeout: Duration) -> Self {
        Self {
            upstream,
            models,
            timeout,
        }
    }

    pub fn has_credentials(&self) -> bool {
        matches!(self.upstream, Upstream::Configured(_))
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Sends `prompt` to each configured model in order and returns the first answer.
    pub async fn complete(&self, prompt: &str) -> Result<GeneratedText, RecommendationError> {
        let mut state = FailoverState::Idle;
        let mut failures: Vec<ModelFailure> = Vec::new();

        loop {
            state = match state {
                FailoverState::Idle => match &self.upstream {
                    Upstream::ConfigurationMissing => {
                        warn!("No API key configured; skipping model calls");
                        return Err(RecommendationError::ConfigurationMissing);
                    }
                    Upstream::Configured(provider) => FailoverState::PromptBuilt {
                        provider: provider.as_ref(),
                        request: CompletionRequest::new(ADVISOR_SYSTEM_PROMPT, prompt),
                    },
                },
                FailoverState::PromptBuilt { provider, request } => {
                    if self.models.is_empty() {
                        FailoverState::Exhausted
                    } else {
                        FailoverState::Calling {
                            provider,
                            request,
                            index: 0,
                        }
                    }
                }
                FailoverState::Calling {
                    provider,
                    request,
                    index,
                } => {
                    let model = &self.models[index];
                    info!("Requesting recommendation from model {model}");

                    match self.attempt(provider, model, &request).await {
                        Ok(text) => FailoverState::Succeeded(GeneratedText {
                            model: model.clone(),
                            text,
                        }),
                        Err(error) => {
                            warn!("Model {model} failed: {error}");
                            failures.push(ModelFailure {
                                model: model.clone(),
                                error,
                            });
                            if index + 1 < self.models.len() {
                                FailoverState::Calling {
                                    provider,
                                    request,
                                    index: index + 1,
                                }
                            } else {
                                FailoverState::Exhausted
                            }
                        }
                    }
                }
                FailoverState::Succeeded(generated) => {
                    info!("Recommendation generated by model {}", generated.model);
                    return Ok(generated);
                }
                FailoverState::Exhausted => {
                    let summary: Vec<String> = failures
                        .iter()
                        .map(|f| format!("{}: {}", f.model, f.error))
                        .collect();
                    warn!(
                        "All {} models failed; falling back to template [{}]",
                        failures.len(),
                        summary.join("; ")
                    );
                    return Err(RecommendationError::ProvidersExhausted { attempts: failures });
                }
            };
        }
    }

    /// One bounded call. The provider future is dropped if the timeout fires.
    async fn attempt(
        &self,
        provider: &dyn ModelProvider,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, provider.attempt(model, request, self.timeout))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        }
    }

    /// Produces the narrative for an already-matched product list. Never fails:
    /// upstream trouble yields a degraded template result instead.
    pub async fn recommend(
        &self,
        profile: &UserProfile,
        matches: Vec<MatchedProduct>,
    ) -> RecommendationResult {
        let prompt = build_prompt(profile, &matches);

        match self.complete(&prompt).await {
            Ok(generated) => RecommendationResult::generated(matches, generated.text),
            Err(e) => {
                let standard = template::render(profile, &matches);
                let reason = e.degradation_reason();
                RecommendationResult::degraded(matches, degraded_narrative(reason, &standard), reason)
            }
        }
    }
}

/// Wraps template output with the notice for the given degradation path.
pub fn degraded_narrative(reason: DegradationReason, standard: &str) -> String {
    match reason {
        DegradationReason::ConfigurationMissing => {
            format!("{CONFIGURATION_MISSING_NOTICE}\n\n{standard}")
        }
        DegradationReason::ProvidersExhausted => {
            format!("{standard}\n\n{PROVIDERS_EXHAUSTED_NOTICE}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::models::product::{Goal, ProductRecord, RiskLevel};
    use crate::models::recommendation::{MatchTier, RecommendationSource};

    #[derive(Clone)]
    enum Outcome {
        Reply(&'static str),
        Reject(u16),
        Hang,
    }

    /// In-memory provider that answers per model from a fixed script and records calls.
    struct ScriptedProvider {
        script: HashMap<String, Outcome>,
        calls: Mutex<Vec<String>>,
        requests: Mutex<Vec<(String, String)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(script: &[(&str, Outcome)]) -> Arc<Self> {
            Arc::new(Self {
                script: script
                    .iter()
                    .map(|(m, o)| (m.to_string(), o.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct InFlightGuard<'a>(&'a AtomicUsize);

    impl Drop for InFlightGuard<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn attempt(
            &self,
            model: &str,
            request: &CompletionRequest,
            _timeout: Duration,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.requests
                .lock()
                .unwrap()
                .push((request.system.clone(), request.prompt.clone()));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlightGuard(&self.in_flight);

            match self.script.get(model).cloned().unwrap_or(Outcome::Reject(404)) {
                Outcome::Reply(text) => Ok(text.to_string()),
                Outcome::Reject(status) => Err(LlmError::Api {
                    status,
                    message: "upstream rejected".to_string(),
                }),
                Outcome::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    fn models() -> Vec<String> {
        vec!["m1".to_string(), "m2".to_string(), "m3".to_string()]
    }

    fn orchestrator(provider: Arc<ScriptedProvider>) -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(Upstream::Configured(provider), models(), DEFAULT_TIMEOUT)
    }

    fn reference_profile() -> UserProfile {
        UserProfile::new(30, 500_000.0, Goal::TaxSaving, RiskLevel::Medium).unwrap()
    }

    fn reference_matches() -> Vec<MatchedProduct> {
        let product = ProductRecord {
            id: "1".to_string(),
            name: "Tax Shield Plus".to_string(),
            description: "Term cover with 80C benefits".to_string(),
            min_age: 18,
            max_age: 60,
            min_income: 100_000.0,
            premium_factor: 0.02,
            tax_benefit: true,
            suitable_for: BTreeSet::from([Goal::TaxSaving]),
            risk: BTreeSet::from([RiskLevel::Medium]),
        };
        vec![MatchedProduct::new(
            product,
            833.33,
            833.33 * 12.0,
            MatchTier::Exact,
            true,
            true,
        )]
    }

    #[tokio::test]
    async fn test_first_model_success_stops_failover() {
        let provider = ScriptedProvider::new(&[
            ("m1", Outcome::Reply("first")),
            ("m2", Outcome::Reply("second")),
        ]);
        let generated = orchestrator(provider.clone()).complete("prompt").await.unwrap();

        assert_eq!(generated.text, "first");
        assert_eq!(generated.model, "m1");
        assert_eq!(provider.calls(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_fails_over_in_order_without_retry() {
        let provider = ScriptedProvider::new(&[
            ("m1", Outcome::Reject(500)),
            ("m2", Outcome::Reject(429)),
            ("m3", Outcome::Reply("third time lucky")),
        ]);
        let generated = orchestrator(provider.clone()).complete("prompt").await.unwrap();

        assert_eq!(generated.text, "third time lucky");
        assert_eq!(provider.calls(), vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_every_model_receives_the_same_request() {
        let provider = ScriptedProvider::new(&[
            ("m1", Outcome::Reject(500)),
            ("m2", Outcome::Reject(503)),
            ("m3", Outcome::Reply("ok")),
        ]);
        orchestrator(provider.clone()).complete("User Profile: ...").await.unwrap();

        let requests = provider.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 3);
        for (system, prompt) in &requests {
            assert_eq!(system, ADVISOR_SYSTEM_PROMPT);
            assert_eq!(prompt, "User Profile: ...");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_next_model() {
        let provider = ScriptedProvider::new(&[
            ("m1", Outcome::Hang),
            ("m2", Outcome::Reply("after timeout")),
        ]);
        let started = tokio::time::Instant::now();
        let generated = orchestrator(provider.clone()).complete("prompt").await.unwrap();

        assert_eq!(generated.text, "after timeout");
        assert_eq!(provider.calls(), vec!["m1", "m2"]);
        assert!(started.elapsed() >= DEFAULT_TIMEOUT);
        assert_eq!(provider.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_never_overlap() {
        let provider = ScriptedProvider::new(&[
            ("m1", Outcome::Hang),
            ("m2", Outcome::Hang),
            ("m3", Outcome::Hang),
        ]);
        let result = orchestrator(provider.clone()).complete("prompt").await;

        assert!(result.is_err());
        assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_collects_every_failure() {
        let provider = ScriptedProvider::new(&[
            ("m1", Outcome::Reject(503)),
            ("m2", Outcome::Hang),
            ("m3", Outcome::Reject(400)),
        ]);
        let err = orchestrator(provider).complete("prompt").await.unwrap_err();

        let attempts = match err {
            RecommendationError::ProvidersExhausted { attempts } => attempts,
            other => panic!("expected exhaustion, got {other:?}"),
        };
        let failed: Vec<&str> = attempts.iter().map(|a| a.model.as_str()).collect();
        assert_eq!(failed, vec!["m1", "m2", "m3"]);
        assert!(matches!(attempts[1].error, LlmError::Timeout(d) if d == DEFAULT_TIMEOUT));
    }

    #[tokio::test]
    async fn test_empty_model_list_is_exhausted() {
        let provider = ScriptedProvider::new(&[]);
        let orchestrator =
            RecommendationOrchestrator::new(Upstream::Configured(provider.clone()), vec![], DEFAULT_TIMEOUT);
        let err = orchestrator.complete("prompt").await.unwrap_err();
        assert!(matches!(err, RecommendationError::ProvidersExhausted { ref attempts } if attempts.is_empty()));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_success_returns_text_unmodified() {
        let provider = ScriptedProvider::new(&[("m1", Outcome::Reply("  A term plan suits you.\n"))]);
        let result = orchestrator(provider)
            .recommend(&reference_profile(), reference_matches())
            .await;

        assert_eq!(result.narrative, "  A term plan suits you.\n");
        assert_eq!(result.source, RecommendationSource::AIGenerated);
        assert!(!result.degraded);
        assert_eq!(result.degradation, None);
        assert_eq!(result.products, reference_matches());
    }

    #[tokio::test]
    async fn test_recommend_all_models_fail_degrades_to_template() {
        let provider = ScriptedProvider::new(&[
            ("m1", Outcome::Reject(500)),
            ("m2", Outcome::Reject(500)),
            ("m3", Outcome::Reject(500)),
        ]);
        let profile = reference_profile();
        let result = orchestrator(provider)
            .recommend(&profile, reference_matches())
            .await;

        let standard = template::render(&profile, &reference_matches());
        assert!(result.degraded);
        assert_eq!(result.source, RecommendationSource::Template);
        assert_eq!(result.degradation, Some(DegradationReason::ProvidersExhausted));
        assert_eq!(
            result.narrative,
            format!("{standard}\n\n{PROVIDERS_EXHAUSTED_NOTICE}")
        );
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_calls() {
        let orchestrator =
            RecommendationOrchestrator::new(Upstream::ConfigurationMissing, models(), DEFAULT_TIMEOUT);
        assert!(!orchestrator.has_credentials());
        assert!(matches!(
            orchestrator.complete("prompt").await,
            Err(RecommendationError::ConfigurationMissing)
        ));

        let profile = reference_profile();
        let result = orchestrator.recommend(&profile, reference_matches()).await;
        assert!(result.degraded);
        assert_eq!(result.source, RecommendationSource::Template);
        assert_eq!(result.degradation, Some(DegradationReason::ConfigurationMissing));
        assert!(result.narrative.starts_with(CONFIGURATION_MISSING_NOTICE));
        assert!(result
            .narrative
            .ends_with(&template::render(&profile, &reference_matches())));
    }

    #[tokio::test]
    async fn test_no_matches_still_flows_through_model() {
        let provider = ScriptedProvider::new(&[("m1", Outcome::Reply("Try widening your goals."))]);
        let result = orchestrator(provider.clone())
            .recommend(&reference_profile(), vec![])
            .await;
        assert!(result.products.is_empty());
        assert_eq!(result.narrative, "Try widening your goals.");
        assert_eq!(provider.calls(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_no_matches_degraded_uses_no_match_message() {
        let orchestrator =
            RecommendationOrchestrator::new(Upstream::ConfigurationMissing, models(), DEFAULT_TIMEOUT);
        let result = orchestrator.recommend(&reference_profile(), vec![]).await;
        assert!(result.narrative.ends_with(template::NO_MATCHES_MESSAGE));
    }
}
