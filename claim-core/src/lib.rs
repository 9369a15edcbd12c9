pub mod assistant;
#[cfg(feature = "rig")]
pub mod backend;
pub mod breaker;
pub mod decision;
pub mod detection;
pub mod error;
pub mod gateway;

// Re-export commonly used types
pub use assistant::{ASSISTANT_PERSONA, ClaimAssistant};
#[cfg(feature = "rig")]
pub use backend::OpenRouterBackend;
pub use breaker::{BreakerConfig, CircuitBreaker};
pub use decision::{Decision, FinalDamage, decide};
pub use detection::{DamageClass, DamageDetector, Detection};
pub use error::{ClaimError, Result};
pub use gateway::{
    AnswerResult, AnswerSource, AssistantBackend, AssistantGateway, ChatRequest, fallback_answer,
};
