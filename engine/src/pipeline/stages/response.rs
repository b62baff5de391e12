//! Direct answer for requests that are not development work.

use async_trait::async_trait;
use sdk::errors::EngineError;
use tracing::debug;

use crate::llm::Message;
use crate::pipeline::context::StageContext;
use crate::pipeline::prompts;
use crate::pipeline::stage::{Stage, StageId};
use crate::pipeline::state::{ConversationState, StateDelta};

pub struct ResponseStage;

#[async_trait]
impl Stage for ResponseStage {
    fn id(&self) -> StageId {
        StageId::GenerateResponse
    }

    async fn run(
        &self,
        ctx: &StageContext,
        state: &ConversationState,
    ) -> Result<StateDelta, EngineError> {
        // Development runs end on the code report.
        if state.development {
            debug!("Development run finished, nothing to answer");
            return Ok(StateDelta::end());
        }

        let question = state.latest_user_message();

        if let Some(call) = ctx.probe_tools(self.id(), state, question).await? {
            return Ok(StateDelta::tool_request(self.id(), call));
        }

        let notes = prompts::research_notes(state.trailing_tool_results());
        let answer = ctx.complete(prompts::response(question, &notes)).await?;

        Ok(StateDelta::end().message(Message::assistant(answer)))
    }
}
