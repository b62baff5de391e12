//! Stage handlers and the standard pipeline table.

use sdk::errors::EngineError;
use std::sync::Arc;

use super::graph::StageGraph;
use super::stage::{Route, StageId};

pub mod code;
pub mod document;
pub mod intent;
pub mod response;
pub mod tool_dispatch;

pub use code::CodeStage;
pub use document::{DocumentKind, DocumentStage};
pub use intent::IntentStage;
pub use response::ResponseStage;
pub use tool_dispatch::ToolDispatchStage;

/// Append per-file problems below a stage's report.
pub(crate) fn with_notes(report: String, notes: &[String]) -> String {
    if notes.is_empty() {
        return report;
    }
    format!("{}\n\n{}", report, notes.join("\n"))
}

/// The fixed pipeline:
///
/// ```text
/// intent ─┬─> requirements ─> design ─> tasks ─> code ─> response ─> end
///         └───────────────────────────────────────────────^
/// ```
///
/// Every content stage may also detour through tool dispatch, which returns
/// to the stage that asked.
pub fn standard_graph() -> Result<StageGraph, EngineError> {
    use StageId::*;

    let dispatch = Route::Goto(ToolDispatch);

    StageGraph::builder(IntentRecognition)
        .stage(
            Arc::new(IntentStage),
            [
                Route::Goto(GenerateRequirements),
                Route::Goto(GenerateResponse),
                dispatch,
            ],
        )
        .stage(
            Arc::new(DocumentStage::new(DocumentKind::Requirements)),
            [Route::Goto(GenerateDesign), dispatch],
        )
        .stage(
            Arc::new(DocumentStage::new(DocumentKind::Design)),
            [Route::Goto(GenerateTasks), dispatch],
        )
        .stage(
            Arc::new(DocumentStage::new(DocumentKind::Tasks)),
            [Route::Goto(GenerateCode), dispatch],
        )
        .stage(
            Arc::new(CodeStage),
            [Route::Goto(GenerateResponse), dispatch],
        )
        .stage(Arc::new(ResponseStage), [Route::End, dispatch])
        .stage(
            Arc::new(ToolDispatchStage),
            StageId::CONTENT.map(Route::Goto),
        )
        .build()
}
