//! Capabilities and settings injected into every stage.

use sdk::errors::EngineError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::prompts;
use super::stage::StageId;
use super::state::ConversationState;
use crate::config::PipelineConfig;
use crate::llm::{Capabilities, LLMResponse, Message, ToolCall};
use crate::storage::BlobStore;
use crate::text::ReasoningFilter;
use crate::tools::ToolRegistry;

pub struct StageContext {
    pub llm: Capabilities,
    pub tools: ToolRegistry,
    pub store: Arc<dyn BlobStore>,
    pub settings: PipelineConfig,
    reasoning: ReasoningFilter,
}

impl StageContext {
    pub fn new(
        llm: Capabilities,
        tools: ToolRegistry,
        store: Arc<dyn BlobStore>,
        settings: PipelineConfig,
    ) -> Result<Self, EngineError> {
        let reasoning = ReasoningFilter::new(&settings.reasoning_tag)?;
        Ok(Self {
            llm,
            tools,
            store,
            settings,
            reasoning,
        })
    }

    /// Strip reasoning spans and surrounding whitespace from model output
    pub fn clean(&self, raw: &str) -> String {
        self.reasoning.strip(raw).trim().to_string()
    }

    /// Plain completion of a single prompt, cleaned
    pub async fn complete(&self, prompt: String) -> Result<String, EngineError> {
        let raw = self.llm.complete(&[Message::user(prompt)]).await?;
        Ok(self.clean(&raw))
    }

    /// Ask the tool-augmented capability whether `stage` needs a tool first.
    ///
    /// Earlier tool results for this stage ride along so the model can see
    /// what it already looked up. Once the stage has used up its tool
    /// rounds, or no tools are registered, the probe is skipped.
    pub async fn probe_tools(
        &self,
        stage: StageId,
        state: &ConversationState,
        input: &str,
    ) -> Result<Option<ToolCall>, EngineError> {
        if self.tools.is_empty() {
            return Ok(None);
        }
        let rounds = state.tool_rounds(stage);
        if rounds >= self.settings.max_tool_calls_per_stage {
            debug!("{} used {} tool rounds, skipping probe", stage, rounds);
            return Ok(None);
        }

        let mut messages = vec![Message::user(input)];
        messages.extend(state.trailing_tool_results().iter().cloned());

        match self
            .llm
            .complete_with_tools(&messages, &self.tools.specs())
            .await?
        {
            LLMResponse::ToolCall(call) => {
                debug!("{} requested tool {}", stage, call.name);
                Ok(Some(call))
            }
            LLMResponse::FinalAnswer(_) => Ok(None),
        }
    }

    /// Short work report on a freshly generated document
    pub async fn work_report(
        &self,
        state: &ConversationState,
        content: &str,
        kind: &str,
    ) -> Result<String, EngineError> {
        let prompt = prompts::work_report(
            state.latest_user_message(),
            kind,
            content,
            self.settings.report_excerpt_chars,
        );
        self.complete(prompt).await
    }

    /// Write through the store, turning a failure into a note for the
    /// conversation instead of an error.
    pub async fn save(&self, path: &Path, content: &str) -> Option<String> {
        match self.store.write(path, content).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Failed to write {}: {}", path.display(), e);
                Some(format!("Error writing file {}: {}", path.display(), e))
            }
        }
    }

    /// Project directory, which every document stage needs
    pub fn project_dir(&self, state: &ConversationState) -> Result<PathBuf, EngineError> {
        state
            .project_dir
            .clone()
            .ok_or_else(|| EngineError::MissingInput("project directory".to_string()))
    }
}
