//! Requirements, design and task list generation.
//!
//! The three document stages share one shape: probe for tools, generate the
//! document from its upstream input, persist it under the docs directory,
//! then append a work report.

use async_trait::async_trait;
use sdk::errors::EngineError;
use tracing::info;

use crate::llm::Message;
use crate::pipeline::context::StageContext;
use crate::pipeline::prompts;
use crate::pipeline::stage::{Stage, StageId};
use crate::pipeline::state::{ConversationState, StateDelta};
use super::with_notes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Requirements,
    Design,
    Tasks,
}

impl DocumentKind {
    pub fn stage(&self) -> StageId {
        match self {
            DocumentKind::Requirements => StageId::GenerateRequirements,
            DocumentKind::Design => StageId::GenerateDesign,
            DocumentKind::Tasks => StageId::GenerateTasks,
        }
    }

    pub fn next(&self) -> StageId {
        match self {
            DocumentKind::Requirements => StageId::GenerateDesign,
            DocumentKind::Design => StageId::GenerateTasks,
            DocumentKind::Tasks => StageId::GenerateCode,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Requirements => "requirements.md",
            DocumentKind::Design => "design.md",
            DocumentKind::Tasks => "tasks.md",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Requirements => "requirements document",
            DocumentKind::Design => "design document",
            DocumentKind::Tasks => "task list",
        }
    }

    /// Upstream text this document is generated from
    fn input<'a>(&self, state: &'a ConversationState) -> Result<&'a str, EngineError> {
        let input = match self {
            DocumentKind::Requirements => Some(state.latest_user_message()),
            DocumentKind::Design => state.requirements.as_deref(),
            DocumentKind::Tasks => state.design.as_deref(),
        };
        input.ok_or_else(|| EngineError::MissingInput(format!("input for {}", self.label())))
    }

    fn prompt(&self, input: &str, notes: &str) -> String {
        match self {
            DocumentKind::Requirements => prompts::requirements(input, notes),
            DocumentKind::Design => prompts::design(input, notes),
            DocumentKind::Tasks => prompts::tasks(input, notes),
        }
    }

    fn store(&self, delta: StateDelta, content: String) -> StateDelta {
        match self {
            DocumentKind::Requirements => delta.requirements(content),
            DocumentKind::Design => delta.design(content),
            DocumentKind::Tasks => delta.tasks(content),
        }
    }
}

pub struct DocumentStage {
    kind: DocumentKind,
}

impl DocumentStage {
    pub fn new(kind: DocumentKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Stage for DocumentStage {
    fn id(&self) -> StageId {
        self.kind.stage()
    }

    async fn run(
        &self,
        ctx: &StageContext,
        state: &ConversationState,
    ) -> Result<StateDelta, EngineError> {
        let input = self.kind.input(state)?;

        if let Some(call) = ctx.probe_tools(self.id(), state, input).await? {
            return Ok(StateDelta::tool_request(self.id(), call));
        }

        let project_dir = ctx.project_dir(state)?;
        let research = prompts::research_notes(state.trailing_tool_results());
        let content = ctx.complete(self.kind.prompt(input, &research)).await?;

        let path = project_dir
            .join(&ctx.settings.docs_dir)
            .join(self.kind.file_name());
        let problems: Vec<String> = ctx.save(&path, &content).await.into_iter().collect();
        if problems.is_empty() {
            info!("Wrote {} to {}", self.kind.label(), path.display());
        }

        let report = ctx.work_report(state, &content, self.kind.label()).await?;

        Ok(self
            .kind
            .store(StateDelta::goto(self.kind.next()), content)
            .message(Message::assistant(with_notes(report, &problems))))
    }
}
