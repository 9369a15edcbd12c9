use std::sync::Arc;

use tracing::info;

use crate::decision::Decision;
use crate::detection::Detection;
use crate::gateway::{AnswerResult, AssistantGateway, ChatRequest};

/// Fixed system persona for the claims assistant
pub const ASSISTANT_PERSONA: &str = "You are an insurance claim assistant.
You explain damage assessment decisions clearly and honestly.
You never hallucinate.
You only use the provided data.";

/// Thin orchestrator: assembles the outbound request from the prediction
/// context and the user's question, then delegates to the gateway.
pub struct ClaimAssistant {
    gateway: Arc<AssistantGateway>,
}

impl ClaimAssistant {
    pub fn new(gateway: Arc<AssistantGateway>) -> Self {
        Self { gateway }
    }

    pub async fn answer(
        &self,
        question: &str,
        decision: &Decision,
        detections: &[Detection],
    ) -> AnswerResult {
        info!(
            question_length = question.len(),
            damage_count = decision.damage_count,
            "answering claim question"
        );
        let request = build_request(question, decision, detections);
        self.gateway.invoke(&request, decision).await
    }
}

fn build_request(question: &str, decision: &Decision, detections: &[Detection]) -> ChatRequest {
    let detections_json =
        serde_json::to_string_pretty(detections).expect("detections are serializable");
    let decision_json = serde_json::to_string_pretty(decision).expect("decision is serializable");

    let user = format!(
        "Here is the damage detection result:\nDetections: {}\n\nFinal Decision:\n{}\n\nUser question:\n{}\n\nExplain the answer clearly in simple terms.",
        detections_json, decision_json, question
    );

    ChatRequest {
        system: ASSISTANT_PERSONA.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::BreakerConfig;
    use crate::decision::decide;
    use crate::detection::DamageClass;
    use crate::gateway::AnswerSource;

    #[test]
    fn request_combines_context_and_question() {
        let detections = vec![Detection::new(DamageClass::Dent, 0.9)];
        let decision = decide(&detections);

        let request = build_request("How bad is it?", &decision, &detections);

        assert_eq!(request.system, ASSISTANT_PERSONA);
        assert!(request.user.contains("How bad is it?"));
        assert!(request.user.contains("\"dent\""));
        assert!(request.user.contains(&decision.estimated_cost_range));
    }

    #[tokio::test]
    async fn degraded_assistant_still_answers() {
        let gateway = Arc::new(AssistantGateway::new(None, BreakerConfig::default()));
        let assistant = ClaimAssistant::new(gateway);
        let detections = vec![Detection::new(DamageClass::Broken, 0.7)];
        let decision = decide(&detections);

        let result = assistant
            .answer("Is this covered?", &decision, &detections)
            .await;

        assert_eq!(result.source, AnswerSource::Fallback);
        assert!(result.answer.contains(&decision.estimated_cost_range));
    }
}
