//! Completion capabilities handed to pipeline stages.
//!
//! Stages never talk to a provider directly. They get a `Capabilities`
//! value with a general provider and, optionally, a dedicated provider for
//! code generation.

use sdk::ToolSpec;
use std::sync::Arc;

use super::{LLMError, LLMProvider, LLMResponse, Message, Result};

#[derive(Clone)]
pub struct Capabilities {
    general: Arc<dyn LLMProvider>,
    code: Option<Arc<dyn LLMProvider>>,
}

impl Capabilities {
    pub fn new(general: Arc<dyn LLMProvider>) -> Self {
        Self {
            general,
            code: None,
        }
    }

    /// Route code generation to a separate provider
    pub fn with_code_provider(mut self, code: Arc<dyn LLMProvider>) -> Self {
        self.code = Some(code);
        self
    }

    /// Plain text completion with no tools bound.
    pub async fn complete(&self, messages: &[Message]) -> Result<String> {
        expect_text(self.general.generate(messages, &[]).await?)
    }

    /// Completion with tools bound; the reply may be a tool call request.
    pub async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LLMResponse> {
        self.general.generate(messages, tools).await
    }

    /// Plain completion on the code provider, or the general one if none is set.
    pub async fn complete_code(&self, messages: &[Message]) -> Result<String> {
        let provider = self.code.as_ref().unwrap_or(&self.general);
        expect_text(provider.generate(messages, &[]).await?)
    }
}

fn expect_text(response: LLMResponse) -> Result<String> {
    match response {
        LLMResponse::FinalAnswer(answer) => Ok(answer.content),
        LLMResponse::ToolCall(call) => Err(LLMError::InvalidRequest(format!(
            "tool call '{}' returned from a completion with no tools bound",
            call.name
        ))),
    }
}
