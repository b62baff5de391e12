//! External tool contract
//!
//! A tool is a named capability the completion model may ask the pipeline to
//! invoke before it can finish. Tools never fail the pipeline: whatever goes
//! wrong is reported back to the model as text so it can retry or move on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Descriptor advertised to the completion model when tools are bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name the model uses to request it
    pub name: String,

    /// One-line description shown to the model
    pub description: String,

    /// JSON schema of the arguments object
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    /// Create a tool spec with a single required string parameter
    pub fn with_string_param(
        name: impl Into<String>,
        description: impl Into<String>,
        param: &str,
        param_description: &str,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    param: {
                        "type": "string",
                        "description": param_description,
                    }
                },
                "required": [param],
            }),
        }
    }
}

/// Trait that all external tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor used for binding and lookup
    fn spec(&self) -> ToolSpec;

    /// Invoke the tool with already-parsed JSON arguments.
    ///
    /// Failures are returned as text, not as errors.
    async fn invoke(&self, arguments: &serde_json::Value) -> String;
}
