pub mod read_file;
pub mod search;

pub use read_file::ReadFileTool;
pub use search::SearchTool;

use sdk::{Tool, ToolSpec};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::ToolCall;

/// Reply fed back to the model when it asks for a tool that does not exist.
pub const UNKNOWN_TOOL_REPLY: &str = "bad tool name, retry";

/// Registry of external tools the pipeline can dispatch to.
///
/// Every registered tool is bound to tool-augmented completions. Dispatch
/// never fails: problems come back as text for the model to read.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry with no tools enabled.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a tool. A later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.spec().name;
        self.tools.retain(|t| t.spec().name != name);
        self.tools.push(tool);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors of every registered tool, in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn available_tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.spec().name).collect()
    }

    /// Dispatch a tool call by name, parsing arguments from JSON.
    ///
    /// Returns the tool output as a string. An unknown name yields
    /// [`UNKNOWN_TOOL_REPLY`]; malformed arguments yield an inline error.
    pub async fn dispatch(&self, call: &ToolCall) -> String {
        debug!("Dispatching tool '{}' with args: {}", call.name, call.arguments);

        let Some(tool) = self.tools.iter().find(|t| t.spec().name == call.name) else {
            warn!(
                "Unknown tool requested: {} (available: {})",
                call.name,
                self.available_tool_names().join(", ")
            );
            return UNKNOWN_TOOL_REPLY.to_string();
        };

        let raw = call.arguments.trim();
        let args: serde_json::Value = if raw.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            match serde_json::from_str(raw) {
                Ok(v) => v,
                Err(e) => {
                    return format!("ERROR: Failed to parse arguments JSON: {}", e);
                }
            }
        };

        tool.invoke(&args).await
    }
}

/// Pull a string argument out of a tool's argument object.
///
/// A bare JSON string is accepted too, since small models often send the
/// value without wrapping it in an object.
pub(crate) fn string_arg<'a>(args: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .or_else(|| args.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
