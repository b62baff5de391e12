//! Stage identifiers, routes and the stage contract.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::fmt;

use super::context::StageContext;
use super::state::{ConversationState, StateDelta};

/// Every stage the pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    IntentRecognition,
    GenerateRequirements,
    GenerateDesign,
    GenerateTasks,
    GenerateCode,
    GenerateResponse,
    ToolDispatch,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::IntentRecognition,
        StageId::GenerateRequirements,
        StageId::GenerateDesign,
        StageId::GenerateTasks,
        StageId::GenerateCode,
        StageId::GenerateResponse,
        StageId::ToolDispatch,
    ];

    /// Stages that may request a tool call and be resumed afterwards
    pub const CONTENT: [StageId; 6] = [
        StageId::IntentRecognition,
        StageId::GenerateRequirements,
        StageId::GenerateDesign,
        StageId::GenerateTasks,
        StageId::GenerateCode,
        StageId::GenerateResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::IntentRecognition => "intent_recognition",
            StageId::GenerateRequirements => "generate_requirements",
            StageId::GenerateDesign => "generate_design",
            StageId::GenerateTasks => "generate_tasks",
            StageId::GenerateCode => "generate_code",
            StageId::GenerateResponse => "generate_response",
            StageId::ToolDispatch => "tool_dispatch",
        }
    }

    pub fn is_content(&self) -> bool {
        !matches!(self, StageId::ToolDispatch)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing directive returned by every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Route {
    Goto(StageId),
    End,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Goto(stage) => write!(f, "{}", stage),
            Route::End => f.write_str("end"),
        }
    }
}

/// A unit of pipeline work.
///
/// Stages read the state snapshot and return a delta; they never mutate
/// the state themselves.
#[async_trait]
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    async fn run(
        &self,
        ctx: &StageContext,
        state: &ConversationState,
    ) -> Result<StateDelta, EngineError>;
}
