use async_trait::async_trait;
use rig::{client::CompletionClient, completion::Prompt, providers::openrouter};

use crate::error::{ClaimError, Result};
use crate::gateway::{AssistantBackend, ChatRequest};

/// Default completion model when ASSISTANT_MODEL is not set
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Assistant backend over the OpenRouter completion API
pub struct OpenRouterBackend {
    client: openrouter::Client,
    model: String,
}

impl OpenRouterBackend {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
        }
    }

    /// Build from OPENROUTER_API_KEY and ASSISTANT_MODEL environment
    /// variables. A missing key is a configuration error the caller can
    /// downgrade to fallback-only operation.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ClaimError::ConfigurationError("OPENROUTER_API_KEY not set".to_string()))?;
        let model =
            std::env::var("ASSISTANT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(&api_key, model))
    }
}

#[async_trait]
impl AssistantBackend for OpenRouterBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&request.system)
            .build();

        agent
            .prompt(request.user.as_str())
            .await
            .map_err(|e| ClaimError::AssistantInvocationFailed(e.to_string()))
    }
}
