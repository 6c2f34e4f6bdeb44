//! Reasoning
//!
//! Proposes candidate causes for a batch. An external reasoning service is
//! consulted when one is configured; any failure there (missing key,
//! timeout, non-2xx, unparsable reply) silently falls back to the
//! deterministic rules in [`fallback`]. Callers always get a
//! [`CauseSuggestions`] value, never an error.

pub mod fallback;
pub mod prompt;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, LlmClient};
use crate::config::thresholds::FallbackThresholds;
use crate::config::ReasoningConfig;
use crate::errors::ApiError;
use crate::log_analysis::{LogSummary, MetricSnapshot};
use crate::observability::scrub;

/// Upper bound for any confidence value.
pub const MAX_CONFIDENCE: f64 = 0.99;

pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_CONFIDENCE)
    }
}

/// A candidate explanation for an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cause {
    pub cause: String,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Total boost applied by the decision engine.
    #[serde(default)]
    pub correlation_boost: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
}

impl Cause {
    pub fn new(cause: impl Into<String>, confidence: f64) -> Self {
        Self {
            cause: cause.into(),
            confidence: clamp_confidence(confidence),
            reasoning: String::new(),
            evidence: Vec::new(),
            correlation_boost: 0.0,
            next_steps: Vec::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_next_steps(mut self, steps: Vec<String>) -> Self {
        self.next_steps = steps;
        self
    }

    /// Clamp confidence and reset any boost claimed by an outside source.
    pub(crate) fn sanitized(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        self.correlation_boost = 0.0;
        self
    }

    /// Default used when no candidate is available.
    pub fn unknown() -> Self {
        Cause::new("Unknown issue - requires manual investigation", 0.3)
            .with_reasoning("Insufficient data to determine root cause")
    }
}

/// Which path produced a [`CauseSuggestions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    External,
    #[default]
    Fallback,
}

/// Candidate causes plus the generic follow-ups that accompany them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CauseSuggestions {
    pub probable_causes: Vec<Cause>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub correlations: Vec<String>,
    #[serde(default)]
    pub source: SuggestionSource,
}

/// Produces [`CauseSuggestions`] for a batch.
#[derive(Clone)]
pub struct CauseProposer {
    client: Option<Arc<dyn LlmClient>>,
    thresholds: FallbackThresholds,
    timeout: Duration,
}

impl CauseProposer {
    /// Rules only.
    pub fn offline(thresholds: FallbackThresholds) -> Self {
        Self {
            client: None,
            thresholds,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_client(
        client: Arc<dyn LlmClient>,
        thresholds: FallbackThresholds,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Some(client),
            thresholds,
            timeout,
        }
    }

    /// Build from configuration. Without usable credentials the proposer
    /// runs offline.
    pub fn from_config(
        config: &ReasoningConfig,
        thresholds: FallbackThresholds,
    ) -> anyhow::Result<Self> {
        if !config.is_available() {
            info!("No reasoning API key configured, using fallback analysis");
            return Ok(Self::offline(thresholds));
        }
        let client = ApiClient::new(config)?;
        Ok(Self::with_client(
            Arc::new(client),
            thresholds,
            Duration::from_secs(config.timeout_secs.max(1)),
        ))
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    pub fn fallback(&self, summary: &LogSummary, metrics: &MetricSnapshot) -> CauseSuggestions {
        fallback::analyze(summary, metrics, &self.thresholds)
    }

    pub async fn propose(&self, summary: &LogSummary, metrics: &MetricSnapshot) -> CauseSuggestions {
        let Some(client) = &self.client else {
            return self.fallback(summary, metrics);
        };

        match self.ask(client.as_ref(), summary, metrics).await {
            Ok(suggestions) => {
                debug!(
                    causes = suggestions.probable_causes.len(),
                    "External reasoning succeeded"
                );
                suggestions
            }
            Err(e) => {
                let safe_err = scrub(&e.to_string());
                warn!(
                    error = safe_err.as_str(),
                    "External reasoning failed, using fallback analysis"
                );
                self.fallback(summary, metrics)
            }
        }
    }

    async fn ask(
        &self,
        client: &dyn LlmClient,
        summary: &LogSummary,
        metrics: &MetricSnapshot,
    ) -> Result<CauseSuggestions, ApiError> {
        let user_prompt = prompt::build_prompt(summary, metrics);
        let call = client.complete(prompt::SYSTEM_PROMPT, &user_prompt);
        let text = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ApiError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;
        prompt::parse_response(&text)
    }
}

impl std::fmt::Debug for CauseProposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CauseProposer")
            .field("online", &self.is_online())
            .field("thresholds", &self.thresholds)
            .field("timeout", &self.timeout)
            .finish()
    }
}
