//! Shared fixtures for pipeline integration tests.
//!
//! `ScriptedProvider` answers from a closure and records every request, so
//! tests can drive the pipeline without a model server.

#![allow(dead_code)]

use async_trait::async_trait;
use autospec_engine::config::PipelineConfig;
use autospec_engine::llm::{
    Capabilities, FinalAnswer, LLMError, LLMProvider, LLMResponse, Message, MessageRole, ToolCall,
};
use autospec_engine::pipeline::{standard_graph, PipelineEngine, StageContext};
use autospec_engine::storage::BlobStore;
use autospec_engine::tools::ToolRegistry;
use sdk::{Tool, ToolSpec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded request
#[derive(Debug, Clone)]
pub struct Request {
    pub messages: Vec<Message>,
    pub tools_bound: bool,
}

impl Request {
    /// Content of the first user message, which carries the prompt
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

type Script = dyn Fn(&Request) -> Result<LLMResponse, LLMError> + Send + Sync;

pub struct ScriptedProvider {
    script: Box<Script>,
    log: Mutex<Vec<Request>>,
}

impl ScriptedProvider {
    pub fn new(
        script: impl Fn(&Request) -> Result<LLMResponse, LLMError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LLMResponse, LLMError> {
        let request = Request {
            messages: messages.to_vec(),
            tools_bound: !tools.is_empty(),
        };
        self.log.lock().unwrap().push(request.clone());
        (self.script)(&request)
    }
}

pub fn answer(text: impl Into<String>) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse::FinalAnswer(FinalAnswer::new(text)))
}

pub fn tool_call(name: &str, arguments: &str) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse::ToolCall(ToolCall::generated(name, arguments)))
}

/// Plain-mode answers for every stage prompt of a development run.
///
/// Returns `None` for prompts it does not recognize.
pub fn dev_answer(prompt: &str) -> Option<String> {
    let reply = if prompt.starts_with("Decide whether") {
        "yes, this is a development request".to_string()
    } else if prompt.starts_with("Propose a short English CamelCase folder name") {
        "TodoApp".to_string()
    } else if prompt.starts_with("Write a requirements document") {
        "<think>\nwhat does the user want?\n</think>\n# Requirements\n- add todo".to_string()
    } else if prompt.starts_with("Write a technical design document") {
        "# Design\n- storage".to_string()
    } else if prompt.starts_with("Turn this design into an implementation plan") {
        "# Tasks\n1. build it".to_string()
    } else if prompt.starts_with("Implement the following task list") {
        "Files:\n```python filename=app.py\nprint('todo')\n```\n```python filename=store/db.py\nDB = {}\n```"
            .to_string()
    } else if let Some(rest) = prompt.strip_prefix("Write a brief work report about the ") {
        let kind = rest.split(" that was just produced").next().unwrap_or(rest);
        format!("Report: {}", kind)
    } else if prompt.starts_with("Answer the user's question") {
        "It is sunny.".to_string()
    } else {
        return None;
    };
    Some(reply)
}

/// A development run where no stage asks for a tool
pub fn dev_script(request: &Request) -> Result<LLMResponse, LLMError> {
    if request.tools_bound {
        return answer("no tool needed");
    }
    match dev_answer(request.prompt()) {
        Some(reply) => answer(reply),
        None => Err(LLMError::InvalidRequest(format!(
            "unexpected prompt: {}",
            request.prompt()
        ))),
    }
}

/// Same as [`dev_script`] but the intent classifier says no
pub fn chat_script(request: &Request) -> Result<LLMResponse, LLMError> {
    if !request.tools_bound && request.prompt().starts_with("Decide whether") {
        return answer("否，这是闲聊");
    }
    dev_script(request)
}

/// Tool that counts its invocations and echoes its query
pub struct FakeSearch {
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for FakeSearch {
    fn spec(&self) -> ToolSpec {
        ToolSpec::with_string_param("search", "Web search", "query", "terms")
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        format!(
            "results for {}",
            arguments
                .get("query")
                .and_then(|q| q.as_str())
                .unwrap_or("?")
        )
    }
}

/// Engine over the standard graph with the given collaborators
pub fn engine_with(
    provider: Arc<dyn LLMProvider>,
    tools: ToolRegistry,
    store: Arc<dyn BlobStore>,
    settings: PipelineConfig,
) -> PipelineEngine {
    let ctx = StageContext::new(Capabilities::new(provider), tools, store, settings)
        .expect("valid stage context");
    PipelineEngine::new(standard_graph().expect("standard graph"), ctx)
}
