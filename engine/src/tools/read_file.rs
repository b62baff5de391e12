//! Read a workspace file through the blob store.

use async_trait::async_trait;
use sdk::{Tool, ToolSpec};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::string_arg;
use crate::storage::BlobStore;

pub const READ_FILE_TOOL_NAME: &str = "read_file";

pub struct ReadFileTool {
    store: Arc<dyn BlobStore>,
}

impl ReadFileTool {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::with_string_param(
            READ_FILE_TOOL_NAME,
            "Read a text file from the workspace",
            "path",
            "Path relative to the workspace root",
        )
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> String {
        let Some(path) = string_arg(arguments, "path") else {
            return "ERROR: missing 'path' argument".to_string();
        };

        info!("Reading file: {}", path);

        match self.store.read(Path::new(path)).await {
            Ok(Some(content)) => content,
            Ok(None) => format!("file {} does not exist", path),
            Err(e) => format!("ERROR: {}", e),
        }
    }
}
