//! Runs the pending tool call and resumes the stage that asked for it.

use async_trait::async_trait;
use sdk::errors::EngineError;
use tracing::info;

use crate::llm::Message;
use crate::pipeline::context::StageContext;
use crate::pipeline::stage::{Stage, StageId};
use crate::pipeline::state::{ConversationState, StateDelta};

pub struct ToolDispatchStage;

#[async_trait]
impl Stage for ToolDispatchStage {
    fn id(&self) -> StageId {
        StageId::ToolDispatch
    }

    async fn run(
        &self,
        ctx: &StageContext,
        state: &ConversationState,
    ) -> Result<StateDelta, EngineError> {
        let call = state
            .pending_tool_call
            .as_ref()
            .ok_or(EngineError::MissingToolCall)?;
        let resume = state.return_to.unwrap_or(StageId::IntentRecognition);

        info!("Dispatching tool {} for {}", call.name, resume);
        let output = ctx.tools.dispatch(call).await;

        Ok(StateDelta::goto(resume)
            .message(Message::tool_result(output, call))
            .resolved())
    }
}
