//! Pipeline Engine
//!
//! Runs one conversation through the stage graph:
//!
//! 1. Run the current stage against the latest state snapshot
//! 2. Check the returned route against the graph table
//! 3. Merge the delta into the state
//! 4. Follow the route until a stage ends the run
//!
//! A step limit guards against a model that keeps asking for tools.

use sdk::errors::EngineError;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::context::StageContext;
use super::graph::StageGraph;
use super::stage::{Route, StageId};
use super::state::ConversationState;
use crate::llm::{Message, MessageRole};

/// Progress notifications emitted while a run is in flight
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A stage is about to run
    StageStarted { stage: StageId },
    /// A stage appended a message to the conversation
    MessageAppended { stage: StageId, message: Message },
    /// A stage asked for a tool before it can continue
    ToolRequested { stage: StageId, tool: String },
    /// A stage returned and its delta was applied
    StageFinished { stage: StageId, route: Route },
    /// The run reached its terminal route
    Completed { steps: usize },
}

pub struct PipelineEngine {
    graph: StageGraph,
    ctx: StageContext,
    max_steps: usize,
    events: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl PipelineEngine {
    pub fn new(graph: StageGraph, ctx: StageContext) -> Self {
        let max_steps = ctx.settings.max_steps;
        Self {
            graph,
            ctx,
            max_steps,
            events: None,
        }
    }

    /// Send progress events to `tx`
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    /// Run `query` from the entry stage to the end.
    ///
    /// Completion failures from any stage end the run and are returned as is.
    pub async fn run(&self, query: &str) -> Result<ConversationState, EngineError> {
        self.drive(query, self.events.as_ref()).await
    }

    /// Like [`run`](Self::run), sending this run's events to `events`.
    ///
    /// The sender is dropped when the run returns, so a receiver loop ends
    /// right after the last event.
    pub async fn run_observed(
        &self,
        query: &str,
        events: mpsc::UnboundedSender<PipelineEvent>,
    ) -> Result<ConversationState, EngineError> {
        self.drive(query, Some(&events)).await
    }

    async fn drive(
        &self,
        query: &str,
        events: Option<&mpsc::UnboundedSender<PipelineEvent>>,
    ) -> Result<ConversationState, EngineError> {
        let emit = |event: PipelineEvent| {
            if let Some(tx) = events {
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(event);
            }
        };

        let start = Instant::now();
        let mut state = ConversationState::new(query);
        let mut current = self.graph.entry();
        let mut steps = 0usize;

        loop {
            if steps >= self.max_steps {
                return Err(EngineError::MaxStepsExceeded(self.max_steps));
            }
            steps += 1;

            let handler = self.graph.handler(current)?;
            debug!("Step {}/{}: {}", steps, self.max_steps, current);
            emit(PipelineEvent::StageStarted { stage: current });

            let delta = handler.run(&self.ctx, &state).await?;
            let route = delta.route;

            if !self.graph.allows(current, route) {
                return Err(EngineError::IllegalTransition {
                    from: current.to_string(),
                    to: route.to_string(),
                });
            }

            let requested_tool = delta.pending_tool_call.as_ref().map(|c| c.name.clone());
            let appended = delta.messages.clone();
            state.apply(delta)?;

            if let Some(tool) = requested_tool {
                emit(PipelineEvent::ToolRequested {
                    stage: current,
                    tool,
                });
            }
            for message in appended {
                if message.role != MessageRole::Tool {
                    debug!("[{}] {}", current, message.content);
                }
                emit(PipelineEvent::MessageAppended {
                    stage: current,
                    message,
                });
            }
            emit(PipelineEvent::StageFinished {
                stage: current,
                route,
            });
            info!("{} -> {}", current, route);

            match route {
                Route::Goto(next) => current = next,
                Route::End => {
                    info!(
                        "Pipeline finished in {} steps ({:.1}s)",
                        steps,
                        start.elapsed().as_secs_f64()
                    );
                    emit(PipelineEvent::Completed { steps });
                    return Ok(state);
                }
            }
        }
    }
}
