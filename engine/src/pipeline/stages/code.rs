//! Code generation from the task list.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::path::Path;
use tracing::{info, warn};

use crate::llm::Message;
use crate::pipeline::context::StageContext;
use crate::pipeline::prompts;
use crate::pipeline::stage::{Stage, StageId};
use crate::pipeline::state::{ConversationState, StateDelta};
use crate::storage::validate_relative;
use crate::text::{extract_code_blocks, named_files};
use super::with_notes;

pub struct CodeStage;

#[async_trait]
impl Stage for CodeStage {
    fn id(&self) -> StageId {
        StageId::GenerateCode
    }

    async fn run(
        &self,
        ctx: &StageContext,
        state: &ConversationState,
    ) -> Result<StateDelta, EngineError> {
        let tasks = state
            .tasks
            .as_deref()
            .ok_or_else(|| EngineError::MissingInput("task list".to_string()))?;

        if let Some(call) = ctx.probe_tools(self.id(), state, tasks).await? {
            return Ok(StateDelta::tool_request(self.id(), call));
        }

        let project_dir = ctx.project_dir(state)?;
        let research = prompts::research_notes(state.trailing_tool_results());
        let raw = ctx
            .llm
            .complete_code(&[Message::user(prompts::code(tasks, &research))])
            .await?;
        let code = ctx.clean(&raw);

        let src_dir = project_dir.join(&ctx.settings.src_dir);
        let blocks = extract_code_blocks(&code);
        let files = named_files(&blocks);

        let mut written = 0usize;
        let mut notes = Vec::new();
        for (filename, body) in &files {
            if !is_file_name(filename) {
                warn!("Skipping code block with unsafe filename: {}", filename);
                notes.push(format!("Skipped code block with unusable file name {}", filename));
                continue;
            }
            match ctx.save(&src_dir.join(filename), body).await {
                Some(note) => notes.push(note),
                None => written += 1,
            }
        }

        if files.is_empty() && !code.is_empty() {
            let path = src_dir.join(&ctx.settings.default_code_file);
            match ctx.save(&path, &code).await {
                Some(note) => notes.push(note),
                None => written += 1,
            }
        }

        info!("Wrote {} source file(s) under {}", written, src_dir.display());

        let report = ctx.work_report(state, &code, "source code").await?;

        Ok(StateDelta::goto(StageId::GenerateResponse)
            .code(code)
            .message(Message::assistant(with_notes(report, &notes))))
    }
}

/// A relative path that stays inside the source directory and names a file,
/// not a directory.
fn is_file_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.ends_with(['/', '\\']) && path.file_name().is_some() && validate_relative(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_file_name() {
        assert!(is_file_name("app.py"));
        assert!(is_file_name("store/db.py"));
        assert!(!is_file_name("pkg/"));
        assert!(!is_file_name("pkg\\"));
        assert!(!is_file_name("store/.."));
        assert!(!is_file_name("../evil.py"));
        assert!(!is_file_name("/etc/passwd"));
        assert!(!is_file_name(""));
    }
}
