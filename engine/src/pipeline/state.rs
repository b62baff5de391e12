//! Conversation state and the deltas stages return.

use sdk::errors::EngineError;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::stage::{Route, StageId};
use crate::llm::{Message, MessageRole, ToolCall};

/// State threaded through every stage of one run
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    /// Ordered message log
    pub messages: Vec<Message>,

    pub requirements: Option<String>,
    pub design: Option<String>,
    pub tasks: Option<String>,
    pub code: Option<String>,

    /// Project directory, relative to the workspace root
    pub project_dir: Option<PathBuf>,

    /// Tool call waiting for dispatch
    pub pending_tool_call: Option<ToolCall>,

    /// Stage that requested the last tool call
    pub return_to: Option<StageId>,

    /// Whether the request was classified as development work
    pub development: bool,

    /// Completed tool round trips per requesting stage
    tool_rounds: BTreeMap<StageId, usize>,
}

impl ConversationState {
    /// Fresh state for one incoming query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(query)],
            ..Default::default()
        }
    }

    /// Content of the most recent user message
    pub fn latest_user_message(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Tool results at the end of the log, oldest first
    pub fn trailing_tool_results(&self) -> &[Message] {
        let start = self
            .messages
            .iter()
            .rposition(|m| m.role != MessageRole::Tool)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.messages[start..]
    }

    /// Tool round trips already completed on behalf of `stage`
    pub fn tool_rounds(&self, stage: StageId) -> usize {
        self.tool_rounds.get(&stage).copied().unwrap_or(0)
    }

    /// Last message in the log
    pub fn final_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Merge a delta into the state.
    ///
    /// Document fields and the project directory are write-once; a second
    /// write is rejected and leaves the state untouched.
    pub fn apply(&mut self, delta: StateDelta) -> Result<(), EngineError> {
        check_unset("requirements", &self.requirements, &delta.requirements)?;
        check_unset("design", &self.design, &delta.design)?;
        check_unset("tasks", &self.tasks, &delta.tasks)?;
        check_unset("code", &self.code, &delta.code)?;
        check_unset("project_dir", &self.project_dir, &delta.project_dir)?;

        if delta.tool_call_resolved {
            self.pending_tool_call = None;
            if let Some(stage) = self.return_to {
                *self.tool_rounds.entry(stage).or_insert(0) += 1;
            }
        }

        self.messages.extend(delta.messages);
        set_once(&mut self.requirements, delta.requirements);
        set_once(&mut self.design, delta.design);
        set_once(&mut self.tasks, delta.tasks);
        set_once(&mut self.code, delta.code);
        set_once(&mut self.project_dir, delta.project_dir);

        if let Some(development) = delta.development {
            self.development = development;
        }
        if let Some(call) = delta.pending_tool_call {
            self.pending_tool_call = Some(call);
        }
        if let Some(stage) = delta.return_to {
            self.return_to = Some(stage);
        }

        Ok(())
    }
}

fn check_unset<T>(field: &str, current: &Option<T>, incoming: &Option<T>) -> Result<(), EngineError> {
    if current.is_some() && incoming.is_some() {
        return Err(EngineError::DocumentRewritten(field.to_string()));
    }
    Ok(())
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Partial update returned by a stage, carrying exactly one route
#[derive(Debug, Clone)]
pub struct StateDelta {
    pub messages: Vec<Message>,
    pub requirements: Option<String>,
    pub design: Option<String>,
    pub tasks: Option<String>,
    pub code: Option<String>,
    pub project_dir: Option<PathBuf>,
    pub development: Option<bool>,
    pub pending_tool_call: Option<ToolCall>,
    pub return_to: Option<StageId>,
    /// Set by tool dispatch once the pending call has been answered
    pub tool_call_resolved: bool,
    pub route: Route,
}

impl StateDelta {
    fn with_route(route: Route) -> Self {
        Self {
            messages: Vec::new(),
            requirements: None,
            design: None,
            tasks: None,
            code: None,
            project_dir: None,
            development: None,
            pending_tool_call: None,
            return_to: None,
            tool_call_resolved: false,
            route,
        }
    }

    /// Empty delta routing to `stage`
    pub fn goto(stage: StageId) -> Self {
        Self::with_route(Route::Goto(stage))
    }

    /// Empty delta ending the run
    pub fn end() -> Self {
        Self::with_route(Route::End)
    }

    /// Delta asking for `call` to be dispatched before `requester` continues
    pub fn tool_request(requester: StageId, call: ToolCall) -> Self {
        Self {
            pending_tool_call: Some(call),
            return_to: Some(requester),
            ..Self::goto(StageId::ToolDispatch)
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn requirements(mut self, content: String) -> Self {
        self.requirements = Some(content);
        self
    }

    pub fn design(mut self, content: String) -> Self {
        self.design = Some(content);
        self
    }

    pub fn tasks(mut self, content: String) -> Self {
        self.tasks = Some(content);
        self
    }

    pub fn code(mut self, content: String) -> Self {
        self.code = Some(content);
        self
    }

    pub fn project_dir(mut self, dir: PathBuf) -> Self {
        self.project_dir = Some(dir);
        self
    }

    pub fn development(mut self, development: bool) -> Self {
        self.development = Some(development);
        self
    }

    pub fn resolved(mut self) -> Self {
        self.tool_call_resolved = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_holds_query() {
        let state = ConversationState::new("build a todo app");
        assert_eq!(state.latest_user_message(), "build a todo app");
        assert!(state.trailing_tool_results().is_empty());
        assert!(!state.development);
    }

    #[test]
    fn test_document_fields_are_write_once() {
        let mut state = ConversationState::new("q");
        state
            .apply(StateDelta::goto(StageId::GenerateDesign).requirements("v1".into()))
            .unwrap();

        let err = state
            .apply(
                StateDelta::goto(StageId::GenerateDesign)
                    .requirements("v2".into())
                    .message(Message::assistant("ignored")),
            )
            .unwrap_err();

        assert!(matches!(err, EngineError::DocumentRewritten(ref f) if f == "requirements"));
        assert_eq!(state.requirements.as_deref(), Some("v1"));
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_project_dir_is_write_once() {
        let mut state = ConversationState::new("q");
        state
            .apply(StateDelta::goto(StageId::GenerateRequirements).project_dir("A".into()))
            .unwrap();
        assert!(state
            .apply(StateDelta::end().project_dir("B".into()))
            .is_err());
    }

    #[test]
    fn test_tool_round_trip_bookkeeping() {
        let mut state = ConversationState::new("q");
        let call = ToolCall::new("c1", "search", "{}");

        state
            .apply(StateDelta::tool_request(StageId::GenerateDesign, call.clone()))
            .unwrap();
        assert_eq!(state.pending_tool_call, Some(call.clone()));
        assert_eq!(state.return_to, Some(StageId::GenerateDesign));
        assert_eq!(state.tool_rounds(StageId::GenerateDesign), 0);

        state
            .apply(
                StateDelta::goto(StageId::GenerateDesign)
                    .message(Message::tool_result("hits", &call))
                    .resolved(),
            )
            .unwrap();
        assert_eq!(state.pending_tool_call, None);
        assert_eq!(state.tool_rounds(StageId::GenerateDesign), 1);
        assert_eq!(state.trailing_tool_results().len(), 1);
        assert_eq!(state.latest_user_message(), "q");
    }

    #[test]
    fn test_trailing_tool_results_stop_at_other_roles() {
        let call = ToolCall::new("c1", "search", "{}");
        let mut state = ConversationState::new("q");
        state.messages.push(Message::tool_result("old", &call));
        state.messages.push(Message::assistant("summary"));
        assert!(state.trailing_tool_results().is_empty());

        state.messages.push(Message::tool_result("a", &call));
        state.messages.push(Message::tool_result("b", &call));
        let trailing: Vec<_> = state
            .trailing_tool_results()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(trailing, vec!["a", "b"]);
    }
}
