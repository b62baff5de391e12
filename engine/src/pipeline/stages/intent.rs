//! Intent recognition: development request or plain question.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::llm::Message;
use crate::pipeline::context::StageContext;
use crate::pipeline::prompts;
use crate::pipeline::stage::{Stage, StageId};
use crate::pipeline::state::{ConversationState, StateDelta};
use crate::text::{parse_intent, sanitize_project_name, unique_dir_name};

pub struct IntentStage;

impl IntentStage {
    /// Ask the model for a folder name, sanitize it and claim a free directory.
    async fn create_project_dir(
        &self,
        ctx: &StageContext,
        request: &str,
    ) -> Result<PathBuf, EngineError> {
        let proposed = ctx.complete(prompts::project_name(request)).await?;
        let first_line = proposed.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        let name = sanitize_project_name(first_line, ctx.settings.max_project_name_len);
        let dir_name = unique_dir_name(ctx.store.as_ref(), Path::new(""), &name).await?;
        let dir = PathBuf::from(dir_name);

        ctx.store.mkdir(&dir).await?;
        info!("Created project directory {}", dir.display());
        Ok(dir)
    }
}

#[async_trait]
impl Stage for IntentStage {
    fn id(&self) -> StageId {
        StageId::IntentRecognition
    }

    async fn run(
        &self,
        ctx: &StageContext,
        state: &ConversationState,
    ) -> Result<StateDelta, EngineError> {
        let request = state.latest_user_message();

        if let Some(call) = ctx.probe_tools(self.id(), state, request).await? {
            return Ok(StateDelta::tool_request(self.id(), call));
        }

        let answer = ctx.complete(prompts::intent(request)).await?;
        let development = parse_intent(&answer);
        info!("Request classified as development: {}", development);

        if !development {
            return Ok(StateDelta::goto(StageId::GenerateResponse)
                .development(false)
                .message(Message::assistant(
                    "This request is not about software development, so I will answer it directly.",
                )));
        }

        let dir = self.create_project_dir(ctx, request).await?;
        let note = format!(
            "Created project directory {} and started on the requirements document.",
            dir.display()
        );

        Ok(StateDelta::goto(StageId::GenerateRequirements)
            .development(true)
            .project_dir(dir)
            .message(Message::assistant(note)))
    }
}
