//! Command handlers for CLI operations
//!
//! This module implements the two ways the binary runs the pipeline:
//! - ask: process one query and exit
//! - repl: read queries from stdin until `exit`
//!
//! Both build the same engine from config: Ollama providers behind a
//! retrying router and an optional cache, the search and read-file tools,
//! and a local store rooted at the workspace.

use anyhow::{Context, Result};
use sdk::errors::{EngineError, ErrorExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::config::{Config, OllamaConfig};
use crate::llm::ollama::OllamaProvider;
use crate::llm::router::LLMRouter;
use crate::llm::{CachedProvider, Capabilities, LLMProvider, MessageRole};
use crate::pipeline::{
    standard_graph, ConversationState, PipelineEngine, PipelineEvent, StageContext, StageId,
};
use crate::storage::{BlobStore, LocalStore};
use crate::tools::{ReadFileTool, SearchTool, ToolRegistry};

/// Words that end an interactive session
const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

/// Build the pipeline engine described by `config`.
pub fn build_engine(config: &Config) -> Result<PipelineEngine> {
    let general = completion_provider(config, &config.llm.ollama.model)?;
    let mut llm = Capabilities::new(general);

    if let Some(code_model) = &config.llm.ollama.code_model {
        tracing::info!("Using {} for code generation", code_model);
        llm = llm.with_code_provider(completion_provider(config, code_model)?);
    }

    let store: Arc<dyn BlobStore> = Arc::new(LocalStore::new(config.core.workspace.clone()));
    let tools = build_tools(config, Arc::clone(&store))?;

    let ctx = StageContext::new(llm, tools, store, config.pipeline.clone())?;
    let graph = standard_graph()?;

    Ok(PipelineEngine::new(graph, ctx))
}

/// Router over the primary Ollama endpoint and its fallbacks, optionally cached.
fn completion_provider(config: &Config, model: &str) -> Result<Arc<dyn LLMProvider>> {
    let timeout = Duration::from_secs(config.llm.timeout_secs);

    let primary = OllamaConfig {
        model: model.to_string(),
        ..config.llm.ollama.clone()
    };

    let mut providers: Vec<Box<dyn LLMProvider>> = Vec::new();
    for endpoint in std::iter::once(&primary).chain(config.llm.fallbacks.iter()) {
        let provider = OllamaProvider::new(endpoint.base_url.clone(), endpoint.model.clone(), timeout)
            .with_context(|| format!("Failed to create Ollama provider for {}", endpoint.base_url))?
            .with_temperature(endpoint.temperature);
        providers.push(Box::new(provider));
    }

    let router: Arc<dyn LLMProvider> = Arc::new(LLMRouter::new(providers, &config.llm));

    if config.llm.cache {
        Ok(Arc::new(CachedProvider::new(router)))
    } else {
        Ok(router)
    }
}

fn build_tools(config: &Config, store: Arc<dyn BlobStore>) -> Result<ToolRegistry> {
    let mut tools = ToolRegistry::empty();

    if config.search.enabled {
        match &config.search.endpoint {
            Some(endpoint) => {
                let api_key = std::env::var(&config.search.api_key_env).ok();
                let search = SearchTool::new(
                    endpoint.clone(),
                    config.search.query_param.clone(),
                    Duration::from_secs(config.llm.timeout_secs),
                )
                .context("Failed to create search tool")?
                .with_api_key(api_key);
                tools.register(Arc::new(search));
            }
            None => {
                tracing::warn!("Search is enabled but no endpoint is configured; search disabled");
            }
        }
    }

    tools.register(Arc::new(ReadFileTool::new(store)));
    Ok(tools)
}

/// Process one query and print progress and the final response.
pub async fn handle_ask(query: String, config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    let state = run_query(&engine, &query).await?;
    print_outcome(&state, config);
    Ok(())
}

/// Read queries from stdin until `exit`, running each one.
///
/// A failed run is reported and the session continues.
pub async fn handle_repl(config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("AutoSpec interactive session. Type 'exit' to quit.");

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            break;
        }

        match run_query(&engine, query).await {
            Ok(state) => print_outcome(&state, config),
            Err(e) => tracing::debug!("Run failed: {:#}", e),
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Run one query, printing progress as the stages report it.
async fn run_query(engine: &PipelineEngine, query: &str) -> Result<ConversationState> {
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_progress(rx));

    let result = engine.run_observed(query, tx).await;
    printer.await.context("Progress printer panicked")?;

    result.map_err(|e| {
        report_failure(&e);
        anyhow::Error::new(e).context("Pipeline run failed")
    })
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<PipelineEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::StageStarted { stage } if stage != StageId::ToolDispatch => {
                println!("\n▶ {}", stage);
            }
            PipelineEvent::ToolRequested { tool, .. } => {
                println!("  ↳ calling tool '{}'", tool);
            }
            PipelineEvent::MessageAppended { message, .. } if message.role != MessageRole::Tool => {
                println!("{}", message.content);
            }
            PipelineEvent::Completed { steps } => {
                println!("\n✓ Completed in {} steps", steps);
            }
            _ => {}
        }
    }
}

fn report_failure(error: &EngineError) {
    println!("\n✗ Run failed: {}", error);
    println!("  Hint: {}", error.user_hint());
}

fn print_outcome(state: &ConversationState, config: &Config) {
    if let Some(dir) = &state.project_dir {
        println!(
            "  Project: {}",
            config.core.workspace.join(dir).display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(workspace: &std::path::Path) -> Config {
        let mut config = Config::default_config();
        config.core.workspace = workspace.to_path_buf();
        config
    }

    #[test]
    fn test_build_engine_from_default_config() {
        let tmp = TempDir::new().unwrap();
        let engine = build_engine(&test_config(tmp.path())).unwrap();
        // No search endpoint by default, so only read_file is bound.
        assert_eq!(
            engine.context().tools.available_tool_names(),
            vec!["read_file".to_string()]
        );
    }

    #[test]
    fn test_build_engine_with_search_endpoint() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.search.endpoint = Some("http://127.0.0.1:9/search".to_string());
        config.llm.ollama.code_model = Some("qwen2.5-coder:7b".to_string());

        let engine = build_engine(&config).unwrap();
        assert_eq!(
            engine.context().tools.available_tool_names(),
            vec!["search".to_string(), "read_file".to_string()]
        );
    }

    #[test]
    fn test_search_disabled_skips_tool() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.search.enabled = false;
        config.search.endpoint = Some("http://127.0.0.1:9/search".to_string());

        let engine = build_engine(&config).unwrap();
        assert!(!engine
            .context()
            .tools
            .available_tool_names()
            .contains(&"search".to_string()));
    }
}
