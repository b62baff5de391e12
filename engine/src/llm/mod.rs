//! LLM Provider Abstraction Layer
//!
//! This module provides the completion capability consumed by the stage
//! pipeline. The `LLMProvider` trait is the contract every backend implements;
//! passing an empty tool slice is plain text completion, passing tool specs is
//! the bound-tools mode where the answer may instead be a tool call request.

use async_trait::async_trait;
use sdk::ToolSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod cache;
pub mod capabilities;
pub mod ollama;
pub mod router;

pub use cache::CachedProvider;
pub use capabilities::Capabilities;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for sdk::EngineError {
    fn from(err: LLMError) -> Self {
        sdk::EngineError::LLMProvider(err.to_string())
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system, tool)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,

    /// Tool call ID for tool result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// The call a tool result answers, kept so providers can replay the exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_call: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a new tool result message answering `call`
    pub fn tool_result(content: impl Into<String>, call: &ToolCall) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_call_id: Some(call.id.clone()),
            tool_call: Some(call.clone()),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,

    /// Tool result message
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LLMResponse {
    /// LLM wants to call a tool
    ToolCall(ToolCall),

    /// LLM has provided a final answer
    FinalAnswer(FinalAnswer),
}

/// Tool call request from the LLM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Arguments to pass to the tool (JSON string)
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Create a tool call with a freshly generated ID
    pub fn generated(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::new(format!("call_{}", uuid::Uuid::new_v4()), name, arguments)
    }
}

/// Final answer from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAnswer {
    /// The answer content
    pub content: String,
}

impl FinalAnswer {
    /// Create a new final answer
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama")
    fn name(&self) -> &str;

    /// Generate a response from the LLM
    ///
    /// # Arguments
    /// * `messages` - Conversation history including tool results
    /// * `tools` - Tools bound for this call; empty for plain completion
    ///
    /// # Returns
    /// * `Ok(LLMResponse)` - Either a tool call or final answer
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LLMResponse>;

    /// Check if the provider is currently healthy and available
    async fn check_health(&self) -> bool {
        true
    }
}

/// Helper function to parse tool calls from string content.
///
/// Handles multiple LLM output formats:
/// 1. Raw JSON: `{"function": "...", "arguments": {...}}` (or `"name"` instead of `"function"`)
/// 2. Fenced JSON (with or without trailing text): ` ```json\n{...}\n``` `
/// 3. `<tool_call>name({...})</tool_call>` XML markers
/// 4. JSON embedded in prose, found by scanning for `{"function":`
pub fn parse_tool_calls(content: &str) -> Option<ToolCall> {
    let trimmed = content.trim();

    // Pattern 1: Raw JSON
    if let Some(tc) = try_parse_function_json(trimmed) {
        return Some(tc);
    }

    // Pattern 2: Markdown code fence
    if let Some(inner) = extract_fenced_json(trimmed) {
        if let Some(tc) = try_parse_function_json(inner.trim()) {
            return Some(tc);
        }
    }

    // Pattern 3: <tool_call>name({...})</tool_call>
    if let (Some(start), Some(end)) = (trimmed.find("<tool_call>"), trimmed.find("</tool_call>")) {
        if start + 11 <= end {
            let tool_content = &trimmed[start + 11..end];
            if let Some(paren_pos) = tool_content.find('(') {
                let tool_name = &tool_content[..paren_pos];
                let args_end = tool_content.rfind(')').unwrap_or(tool_content.len());
                if paren_pos < args_end {
                    let arguments = &tool_content[paren_pos + 1..args_end];
                    return Some(ToolCall::generated(tool_name.trim(), arguments));
                }
            }
        }
    }

    // Pattern 4: {"function": ... anywhere in prose
    if let Some(pos) = trimmed.find("{\"function\"") {
        if let Some(json_str) = extract_balanced_json(&trimmed[pos..]) {
            if let Some(tc) = try_parse_function_json(json_str) {
                return Some(tc);
            }
        }
    }

    None
}

/// Try to parse a string as a `{"function": "...", "arguments": {...}}` tool call.
fn try_parse_function_json(s: &str) -> Option<ToolCall> {
    let json: serde_json::Value = serde_json::from_str(s).ok()?;
    let function = json
        .get("function")
        .or_else(|| json.get("name"))?
        .as_str()?;
    let arguments = json.get("arguments")?;
    Some(ToolCall::generated(function, arguments.to_string()))
}

/// Extract the body of the first markdown code fence in the text.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract a balanced JSON object starting at position 0 of `s`.
///
/// Counts `{` / `}` depth, respecting string literals, to find the
/// matching close brace.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(user_msg.content, "Hello");
        assert_eq!(user_msg.tool_call_id, None);

        let call = ToolCall::new("call_123", "search", r#"{"query":"rust"}"#);
        let tool_msg = Message::tool_result("result", &call);
        assert_eq!(tool_msg.role, MessageRole::Tool);
        assert_eq!(tool_msg.tool_call_id, Some("call_123".to_string()));
        assert_eq!(tool_msg.tool_call.as_ref().map(|c| c.name.as_str()), Some("search"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ToolCall::generated("search", "{}");
        let b = ToolCall::generated("search", "{}");
        assert!(a.id.starts_with("call_"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("test");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("tool_call"));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_llm_response_serialization() {
        let tool_call = LLMResponse::ToolCall(ToolCall::new("id", "name", "{}"));
        let json = serde_json::to_string(&tool_call).unwrap();
        assert!(json.contains(r#""type":"tool_call"#));

        let final_answer = LLMResponse::FinalAnswer(FinalAnswer::new("answer"));
        let json = serde_json::to_string(&final_answer).unwrap();
        assert!(json.contains(r#""type":"final_answer"#));
    }

    #[test]
    fn test_parse_tool_calls_raw_json() {
        let call = parse_tool_calls(r#"{"function": "search", "arguments": {"query": "todo"}}"#)
            .unwrap();
        assert_eq!(call.name, "search");
        assert!(call.arguments.contains("todo"));
    }

    #[test]
    fn test_parse_tool_calls_name_key() {
        let call = parse_tool_calls(r#"{"name": "search", "arguments": {"query": "x"}}"#).unwrap();
        assert_eq!(call.name, "search");
    }

    #[test]
    fn test_parse_tool_calls_fenced_with_trailing_text() {
        let content = "```json\n{\"function\": \"search\", \"arguments\": {}}\n```\nthen I wait";
        assert_eq!(parse_tool_calls(content).unwrap().name, "search");
    }

    #[test]
    fn test_parse_tool_calls_marker_format() {
        let content = r#"<tool_call>search({"query": "egui"})</tool_call>"#;
        let call = parse_tool_calls(content).unwrap();
        assert_eq!(call.name, "search");
        assert_eq!(call.arguments, r#"{"query": "egui"}"#);
    }

    #[test]
    fn test_parse_tool_calls_embedded_in_prose() {
        let content = r#"Let me look: {"function": "search", "arguments": {"query": "a}b"}} ok"#;
        let call = parse_tool_calls(content).unwrap();
        assert!(call.arguments.contains("a}b"));
    }

    #[test]
    fn test_parse_tool_calls_no_match() {
        assert!(parse_tool_calls("This is just a regular response").is_none());
        assert!(parse_tool_calls("```rust\nfn main() {}\n```").is_none());
    }
}
