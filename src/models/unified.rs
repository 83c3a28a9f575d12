use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::traits::Model;
use super::types::{ChatMessage, MessageRole, ModelConfig, ModelResponse, TokenUsage};
use crate::constants::{DEFAULT_LITELLM_PROXY_URL, HTTP_REQUEST_TIMEOUT_SECS};
use crate::tools::{tool_definitions, ToolCallRequest};

/// Unified model implementation using LiteLLM Proxy.
/// All providers go through the same OpenAI-compatible interface, with the
/// tool registry's schemas attached to every request.
pub struct UnifiedModel {
    client: Client,
    proxy_url: String,
    model_name: String,
    master_key: Option<String>,
}

impl UnifiedModel {
    /// Create a new unified model instance.
    /// Proxy URL priority: environment variable > config > default.
    /// Master key priority: environment variable > config > none.
    pub fn new(
        model_name: &str,
        config_proxy_url: Option<String>,
        config_master_key: Option<String>,
    ) -> Result<Self> {
        let proxy_url = std::env::var("LITELLM_PROXY_URL")
            .ok()
            .or(config_proxy_url)
            .unwrap_or_else(|| DEFAULT_LITELLM_PROXY_URL.to_string());

        let master_key = std::env::var("LITELLM_MASTER_KEY")
            .ok()
            .or(config_master_key);

        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
                .build()?,
            proxy_url,
            model_name: model_name.to_string(),
            master_key,
        })
    }

    fn to_wire(message: &ChatMessage) -> Value {
        match message.role {
            MessageRole::System => json!({ "role": "system", "content": message.content }),
            MessageRole::User => json!({ "role": "user", "content": message.content }),
            MessageRole::Assistant => {
                if message.tool_calls.is_empty() {
                    json!({ "role": "assistant", "content": message.content })
                } else {
                    let tool_calls: Vec<Value> = message
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": serde_json::to_string(&tc.arguments)
                                        .unwrap_or_else(|_| "{}".to_string()),
                                }
                            })
                        })
                        .collect();
                    json!({
                        "role": "assistant",
                        "content": message.content,
                        "tool_calls": tool_calls,
                    })
                }
            }
            MessageRole::Tool => json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id,
                "content": message.content,
            }),
        }
    }
}

#[async_trait]
impl Model for UnifiedModel {
    async fn chat(
        &mut self,
        messages: &[ChatMessage],
        config: &ModelConfig,
    ) -> Result<ModelResponse> {
        let json_messages: Vec<Value> = messages.iter().map(Self::to_wire).collect();

        let mut request_body = json!({
            "model": self.model_name,
            "messages": json_messages,
            "tools": tool_definitions(),
        });

        if let Some(temp) = config.temperature {
            request_body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = config.max_tokens {
            request_body["max_tokens"] = json!(max_tokens);
        }
        if let Some(top_p) = config.top_p {
            request_body["top_p"] = json!(top_p);
        }

        let url = format!("{}/v1/chat/completions", self.proxy_url);

        let mut request = self.client.post(&url).json(&request_body);
        if let Some(key) = &self.master_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.with_context(|| {
            format!(
                "Failed to connect to LiteLLM proxy at {}. Is the proxy running?",
                self.proxy_url
            )
        })?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("LiteLLM proxy error: {}", error_text);
        }

        let response_json: ChatCompletionResponse = response.json().await?;
        let choice = response_json
            .choices
            .into_iter()
            .next()
            .context("Model returned no choices")?;

        let tool_calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                // Arguments arrive as a JSON string; keep the raw text when it
                // fails to parse so the validation error can show it.
                let arguments = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(Value::String(tc.function.arguments));
                ToolCallRequest {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect();

        Ok(ModelResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage: response_json.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model_name: self.model_name.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    async fn validate_connection(&self) -> Result<bool> {
        let health_url = format!("{}/health", self.proxy_url);

        // Short timeout: this is a reachability probe, not a request
        let health_client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()?;

        let mut request = health_client.get(&health_url);
        if let Some(key) = &self.master_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => {
                let models_url = format!("{}/models", self.proxy_url);
                let mut request = health_client.get(&models_url);
                if let Some(key) = &self.master_key {
                    request = request.header("Authorization", format!("Bearer {}", key));
                }
                match request.send().await {
                    Ok(response) => Ok(response.status().is_success()),
                    Err(_) => Ok(false),
                }
            }
        }
    }
}

// Response structures for LiteLLM proxy (OpenAI format)

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn assistant_tool_calls_serialize_arguments_as_string() {
        let message = ChatMessage {
            role: MessageRole::Assistant,
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "git_status".to_string(),
                arguments: json!({"directory": "./repo"}),
            }],
            tool_call_id: None,
            timestamp: Local::now(),
        };

        let wire = UnifiedModel::to_wire(&message);
        assert_eq!(wire["role"], "assistant");
        let arguments = wire["tool_calls"][0]["function"]["arguments"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(arguments).unwrap(),
            json!({"directory": "./repo"})
        );
    }

    #[test]
    fn tool_result_carries_call_id() {
        let wire = UnifiedModel::to_wire(&ChatMessage::tool_result("call_7", "ok"));
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_7");
    }

    #[test]
    fn wire_response_with_tool_calls_decodes() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "git_clone",
                            "arguments": "{\"repo_url\": \"https://x/y/z.git\"}"
                        }
                    }]
                }
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        });

        let decoded: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let tool_calls = decoded.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls[0].function.name, "git_clone");
        assert_eq!(decoded.usage.as_ref().unwrap().total_tokens, 15);
    }
}
