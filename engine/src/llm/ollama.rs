//! Ollama LLM Provider
//!
//! This module implements the LLMProvider trait for Ollama, a local LLM provider.
//! Ollama runs models locally on the user's machine, typically at http://localhost:11434.
//!
//! Key features:
//! - Local execution (no API keys required)
//! - Native tool binding through the `tools` field of `/api/chat`
//! - Fallback to parsing tool calls out of the reply text for models
//!   without native tool support
//! - Replay of earlier tool exchanges so the model sees its own calls

use async_trait::async_trait;
use reqwest::Client;
use sdk::ToolSpec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    FinalAnswer, LLMError, LLMProvider, LLMResponse, Message, MessageRole, Result, ToolCall,
};

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Base URL for Ollama API (typically http://localhost:11434)
    base_url: String,

    /// Model name to use (e.g., "llama3.1:8b")
    model: String,

    /// Sampling temperature passed through `options`
    temperature: f64,

    /// HTTP client for API requests
    client: Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Arguments
    /// * `base_url` - Base URL for Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name to use (e.g., "llama3.1:8b")
    /// * `timeout` - Upper bound for a single HTTP round trip
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.2,
            client,
        })
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Model this provider talks to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert our Message format to Ollama's format.
    ///
    /// A tool result is preceded by the assistant turn that requested it,
    /// since Ollama expects the call and its result as a pair.
    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        let mut converted = Vec::with_capacity(messages.len());

        for msg in messages {
            if let (MessageRole::Tool, Some(call)) = (msg.role, &msg.tool_call) {
                converted.push(OllamaMessage {
                    role: MessageRole::Assistant.to_string(),
                    content: String::new(),
                    tool_calls: Some(vec![OllamaToolCall::from_call(call)]),
                });
            }

            converted.push(OllamaMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
                tool_calls: None,
            });
        }

        converted
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<OllamaTool> {
        tools
            .iter()
            .map(|spec| OllamaTool {
                kind: "function".to_string(),
                function: OllamaFunctionSpec {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    parameters: spec.parameters.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse> {
        let ollama_messages = self.convert_messages(messages);

        tracing::debug!(
            "Ollama request: model={}, messages={}, tools={}, total_chars={}",
            self.model,
            ollama_messages.len(),
            tools.len(),
            ollama_messages
                .iter()
                .map(|m| m.content.len())
                .sum::<usize>()
        );

        let request = OllamaRequest {
            model: self.model.clone(),
            messages: ollama_messages,
            tools: if tools.is_empty() {
                None
            } else {
                Some(Self::convert_tools(tools))
            },
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        tracing::info!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ProviderUnavailable(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        let message = ollama_response.message;

        if !tools.is_empty() {
            if let Some(call) = message
                .tool_calls
                .as_ref()
                .and_then(|calls| calls.first())
            {
                return Ok(LLMResponse::ToolCall(call.to_call()));
            }
            if let Some(tool_call) = super::parse_tool_calls(&message.content) {
                return Ok(LLMResponse::ToolCall(tool_call));
            }
        }

        Ok(LLMResponse::FinalAnswer(FinalAnswer::new(message.content)))
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        matches!(
            self.client.get(&url).send().await,
            Ok(resp) if resp.status().is_success()
        )
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

/// Tool schema as Ollama expects it
#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    kind: String,
    function: OllamaFunctionSpec,
}

#[derive(Debug, Serialize)]
struct OllamaFunctionSpec {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

impl OllamaToolCall {
    fn from_call(call: &ToolCall) -> Self {
        let arguments = serde_json::from_str(&call.arguments)
            .unwrap_or_else(|_| serde_json::Value::String(call.arguments.clone()));
        Self {
            function: OllamaFunctionCall {
                name: call.name.clone(),
                arguments,
            },
        }
    }

    fn to_call(&self) -> ToolCall {
        let arguments = match &self.function.arguments {
            serde_json::Value::Null => "{}".to_string(),
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        ToolCall::generated(self.function.name.clone(), arguments)
    }
}

/// Ollama API response format
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}
