//! Stage pipeline
//!
//! Turns a request into requirements, design, tasks and code by walking a
//! fixed graph of stages. Any content stage may pause for one tool call;
//! the tool dispatch stage answers it and sends control back to the stage
//! that asked.

pub mod context;
pub mod engine;
pub mod graph;
pub mod prompts;
pub mod stage;
pub mod stages;
pub mod state;

pub use context::StageContext;
pub use engine::{PipelineEngine, PipelineEvent};
pub use graph::StageGraph;
pub use stage::{Route, Stage, StageId};
pub use stages::standard_graph;
pub use state::{ConversationState, StateDelta};
