use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::decision::Decision;
use crate::error::Result;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound chat request for the assistant backend
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System persona
    pub system: String,
    /// User content: prediction context plus the question
    pub user: String,
}

/// Interface to the external text-generation backend. The gateway is the
/// only caller.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Assistant,
    Fallback,
}

/// Uniform answer record returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub source: AnswerSource,
}

/// Resilient invocation gateway around the assistant backend.
///
/// External-call failures are always recovered locally: the caller only
/// ever sees `source: assistant` or `source: fallback`, never an error.
/// A breaker tracks consecutive failures and short-circuits to the
/// fallback while its cooldown is running.
pub struct AssistantGateway {
    backend: Option<Arc<dyn AssistantBackend>>,
    breaker: CircuitBreaker,
    call_timeout: Duration,
}

impl AssistantGateway {
    pub fn new(backend: Option<Arc<dyn AssistantBackend>>, config: BreakerConfig) -> Self {
        if backend.is_none() {
            warn!("no assistant backend configured, all answers will use the fallback");
        }
        Self {
            backend,
            breaker: CircuitBreaker::new(config),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Whether the breaker is currently enforcing a cooldown
    pub fn circuit_open(&self) -> bool {
        self.breaker.is_open()
    }

    /// True when no backend is configured and every answer is a fallback
    pub fn is_degraded(&self) -> bool {
        self.backend.is_none()
    }

    /// Invoke the assistant backend, or degrade to the fallback answer.
    pub async fn invoke(&self, request: &ChatRequest, decision: &Decision) -> AnswerResult {
        let Some(backend) = &self.backend else {
            return self.fallback(decision);
        };

        if self.breaker.is_open() {
            info!("circuit open, skipping assistant call");
            return self.fallback(decision);
        }

        let outcome = tokio::time::timeout(self.call_timeout, backend.complete(request)).await;

        match outcome {
            Ok(Ok(answer)) => {
                self.breaker.record_success();
                gauge!("circuit_state", 0.0);
                AnswerResult {
                    answer,
                    source: AnswerSource::Assistant,
                }
            }
            Ok(Err(e)) => self.on_failure(&e.to_string(), decision),
            Err(_) => self.on_failure(
                &format!("timed out after {:?}", self.call_timeout),
                decision,
            ),
        }
    }

    fn on_failure(&self, error: &str, decision: &Decision) -> AnswerResult {
        counter!("assistant_failures_total", 1);
        let opened = self.breaker.record_failure();
        if opened {
            gauge!("circuit_state", 1.0);
        }
        warn!(
            error = %error,
            failure_count = self.breaker.failure_count(),
            circuit_opened = opened,
            "assistant call failed, answering via fallback"
        );
        self.fallback(decision)
    }

    fn fallback(&self, decision: &Decision) -> AnswerResult {
        counter!("assistant_fallback_total", 1);
        AnswerResult {
            answer: fallback_answer(decision),
            source: AnswerSource::Fallback,
        }
    }
}

/// Locally generated answer used whenever the backend cannot be reached.
/// Depends only on the decision, never on the question or the backend.
pub fn fallback_answer(decision: &Decision) -> String {
    let verdict = if decision.claim_approved {
        "appears valid and is provisionally approved"
    } else {
        "is below the automatic approval threshold"
    };
    format!(
        "The assistant is temporarily unavailable, so this is the automated summary: \
         the vehicle shows {} damage at severity level {} of 4, with an estimated \
         repair cost of {}. Your claim {}, pending manual inspection by an adjuster.",
        decision.final_damage, decision.severity_level, decision.estimated_cost_range, verdict
    )
}
