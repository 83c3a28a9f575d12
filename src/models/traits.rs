use anyhow::Result;
use async_trait::async_trait;

use super::types::{ChatMessage, ModelConfig, ModelResponse};

/// Core trait that all model backends must implement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Model: Send + Sync {
    /// Send the conversation to the model and get back text and/or tool calls
    async fn chat(&mut self, messages: &[ChatMessage], config: &ModelConfig)
        -> Result<ModelResponse>;

    /// Get the name of the model
    fn name(&self) -> &str;

    /// Validate that the model is accessible
    async fn validate_connection(&self) -> Result<bool> {
        Ok(true)
    }
}
