//! AutoSpec Engine Library
//!
//! This library provides the core functionality of the AutoSpec engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// LLM provider abstraction layer
pub mod llm;

/// External tools the model can call
pub mod tools;

/// Path-keyed blob storage for generated projects
pub mod storage;

/// Text helpers: reasoning stripping, naming, code block lexing
pub mod text;

/// Stage pipeline engine
pub mod pipeline;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
