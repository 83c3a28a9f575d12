use anyhow::Result;

use super::traits::Model;
use super::unified::UnifiedModel;
use crate::app::Config;
use crate::utils::TillerError;

/// Factory for creating model instances using the unified LLM interface
pub struct ModelFactory;

impl ModelFactory {
    /// Create a model instance from a model identifier with optional config.
    /// Accepts `provider/model` (e.g. "openai/gpt-4o", "anthropic/claude-3-5-sonnet")
    /// or a bare model name, which LiteLLM routes as-is.
    pub fn create(model_id: &str, config: Option<&Config>) -> Result<Box<dyn Model>> {
        if model_id.trim().is_empty() {
            return Err(TillerError::InvalidModel(
                "model identifier is empty; expected 'provider/model' or a model name".to_string(),
            )
            .into());
        }

        let proxy_url = config.and_then(|c| c.litellm.proxy_url.clone());
        let master_key = config.and_then(|c| c.litellm.master_key.clone());

        let model = UnifiedModel::new(model_id, proxy_url, master_key)?;
        Ok(Box::new(model))
    }

    /// List available models from the LiteLLM proxy
    pub async fn list_available() -> Result<Vec<String>> {
        use reqwest::Client;
        use serde::Deserialize;

        #[derive(Deserialize)]
        struct ModelsResponse {
            data: Vec<ModelInfo>,
        }

        #[derive(Deserialize)]
        struct ModelInfo {
            id: String,
        }

        let proxy_url = std::env::var("LITELLM_PROXY_URL")
            .unwrap_or_else(|_| crate::constants::DEFAULT_LITELLM_PROXY_URL.to_string());
        let master_key = std::env::var("LITELLM_MASTER_KEY").ok();

        let client = Client::new();
        let url = format!("{}/v1/models", proxy_url);

        let mut request = client.get(&url);
        if let Some(key) = master_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                let models_response: ModelsResponse = response.json().await?;
                Ok(models_response.data.into_iter().map(|m| m.id).collect())
            }
            _ => {
                // Fallback to common models if the proxy is not available
                Ok(vec![
                    "openai/gpt-4o".to_string(),
                    "openai/gpt-4o-mini".to_string(),
                    "anthropic/claude-3-5-sonnet".to_string(),
                    "ollama/llama3".to_string(),
                    "ollama/qwen2.5-coder".to_string(),
                ])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_accepts_provider_model_and_bare_names() {
        assert!(ModelFactory::create("openai/gpt-4o", None).is_ok());
        assert!(ModelFactory::create("gpt-4o", None).is_ok());
    }

    #[test]
    fn create_rejects_empty_identifier() {
        let err = ModelFactory::create("  ", None).err().unwrap();
        assert!(err.to_string().contains("model identifier is empty"));
    }
}
