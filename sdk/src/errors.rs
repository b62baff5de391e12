//! Error types and handling
//!
//! This module provides the error types used throughout the AutoSpec engine.
//! All errors implement the `ErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Conversation-level failures (an unknown tool name, a failed search, a
//! missing file) are never raised through this type. They are fed back into
//! the conversation as text. `EngineError` covers the failures that end a run.

use std::path::PathBuf;
use thiserror::Error;

/// Trait for engine error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait ErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller. Non-recoverable errors
    /// indicate a defect in the pipeline wiring or the configuration.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **LLM Provider**: Completion capability failures (propagated, never retried by stages)
/// - **Storage**: Blob store failures and rejected paths
/// - **Pipeline**: Routing and state invariant violations
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ErrorExt};
///
/// let error = EngineError::LLMProvider("connection refused".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::DocumentRewritten("requirements".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(PathBuf, String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Path outside workspace: {0:?}")]
    PathOutsideWorkspace(PathBuf),

    // Pipeline errors
    #[error("Illegal transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Stage not registered: {0}")]
    StageNotRegistered(String),

    #[error("Document field written twice: {0}")]
    DocumentRewritten(String),

    #[error("Tool dispatch reached without a pending tool call")]
    MissingToolCall,

    #[error("Stage input missing: {0}")]
    MissingInput(String),

    #[error("Pipeline exceeded {0} steps")]
    MaxStepsExceeded(usize),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::PathCanonicalization(_, _) => "Invalid path specified",

            Self::LLMProvider(_) => "LLM provider unavailable. Is Ollama running?",

            Self::Storage(_) => "Writing project files failed. Check workspace permissions",
            Self::PathOutsideWorkspace(_) => "Generated files must stay inside the workspace",

            Self::IllegalTransition { .. } => "Pipeline routing is inconsistent. Please report this",
            Self::StageNotRegistered(_) => "Pipeline is missing a stage. Please report this",
            Self::DocumentRewritten(_) => "A document was generated twice. Please report this",
            Self::MissingToolCall => "Tool dispatch was reached without a request",
            Self::MissingInput(_) => "A stage ran before its input was produced. Please report this",
            Self::MaxStepsExceeded(_) => "The model kept requesting tools. Try rephrasing",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::IllegalTransition { .. }
            | Self::StageNotRegistered(_)
            | Self::DocumentRewritten(_)
            | Self::MissingToolCall
            | Self::MissingInput(_) => false,

            _ => true,
        }
    }
}
