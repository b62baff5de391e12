//! Configuration management
//!
//! This module handles loading, validation, and management of the AutoSpec
//! configuration. Configuration is stored in TOML format at
//! ~/.autospec/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Workspace path (where project directories are created), log level
//! - **llm**: Ollama endpoint and models, retry and cache settings
//! - **search**: External search tool endpoint
//! - **pipeline**: Stage pipeline tunables (reasoning tag, file layout, limits)
//!
//! # Path Expansion
//!
//! The configuration system automatically:
//! - Expands ~ to the user's home directory
//! - Canonicalizes the workspace path, creating it if it doesn't exist
//!
//! # Examples
//!
//! ```no_run
//! use autospec_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Workspace: {:?}", config.core.workspace);
//! println!("Model: {}", config.llm.ollama.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    pub core: CoreConfig,

    /// LLM provider configuration
    pub llm: LLMConfig,

    /// Search tool configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Stage pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Directory under which project directories are created (supports ~ expansion)
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Primary Ollama endpoint
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Additional endpoints tried in order when the primary fails
    #[serde(default)]
    pub fallbacks: Vec<OllamaConfig>,

    /// Attempts per provider before moving to the next one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Timeout for a single completion call in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cache identical completion requests in memory for the process lifetime
    #[serde(default = "default_true")]
    pub cache: bool,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Dedicated model for the code generation stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_model: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

/// Search tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Bind the search tool to the completion model
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// HTTP endpoint queried with `GET {endpoint}?{query_param}=...`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Query string parameter name
    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// Name of the environment variable holding the bearer key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Stage pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the markup tag whose spans are stripped from model output
    #[serde(default = "default_reasoning_tag")]
    pub reasoning_tag: String,

    /// Maximum length of a generated project directory name
    #[serde(default = "default_max_project_name_len")]
    pub max_project_name_len: usize,

    /// Directory (inside the project) receiving the requirements, design and task documents
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Directory (inside the project) receiving generated source files
    #[serde(default = "default_src_dir")]
    pub src_dir: PathBuf,

    /// File name used when the model answer contains no named code blocks
    #[serde(default = "default_code_file")]
    pub default_code_file: String,

    /// Tool round trips a single stage may request before it must proceed
    #[serde(default = "default_max_tool_calls_per_stage")]
    pub max_tool_calls_per_stage: usize,

    /// Upper bound on stage invocations per run
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Characters of a generated document shown to the work-report prompt
    #[serde(default = "default_report_excerpt_chars")]
    pub report_excerpt_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            query_param: default_query_param(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reasoning_tag: default_reasoning_tag(),
            max_project_name_len: default_max_project_name_len(),
            docs_dir: default_docs_dir(),
            src_dir: default_src_dir(),
            default_code_file: default_code_file(),
            max_tool_calls_per_stage: default_max_tool_calls_per_stage(),
            max_steps: default_max_steps(),
            report_excerpt_chars: default_report_excerpt_chars(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            code_model: None,
            temperature: default_temperature(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            fallbacks: Vec::new(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            cache: true,
        }
    }
}

// Default value functions
fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_attempts() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_api_key_env() -> String {
    "AUTOSPEC_SEARCH_API_KEY".to_string()
}

fn default_reasoning_tag() -> String {
    "think".to_string()
}

fn default_max_project_name_len() -> usize {
    30
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from(".kiro")
}

fn default_src_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_code_file() -> String {
    "main.py".to_string()
}

fn default_max_tool_calls_per_stage() -> usize {
    3
}

fn default_max_steps() -> usize {
    64
}

fn default_report_excerpt_chars() -> usize {
    500
}

impl Config {
    /// Load configuration from the default location (~/.autospec/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails (invalid paths, out-of-range limits)
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::load_from_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn load_from_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable relative workspace
        let config = Self::default_config();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = config;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.autospec/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".autospec").join("config.toml"))
    }

    /// Create a default configuration (not yet validated)
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                workspace: default_workspace(),
                log_level: default_log_level(),
            },
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates log level and numeric limits
    /// - Rejects project-relative directories that escape the project
    /// - Expands ~ in the workspace path and canonicalizes it
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.llm.max_attempts == 0 {
            return Err(EngineError::Config(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.llm.ollama.model.trim().is_empty() {
            return Err(EngineError::Config("llm.ollama.model is empty".to_string()));
        }

        let tag = &self.pipeline.reasoning_tag;
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(EngineError::Config(format!(
                "Invalid reasoning_tag '{}'. Use letters, digits or '_'",
                tag
            )));
        }

        // "Project" plus at least one character
        if self.pipeline.max_project_name_len < 8 {
            return Err(EngineError::Config(
                "pipeline.max_project_name_len must be at least 8".to_string(),
            ));
        }
        if self.pipeline.max_steps == 0 {
            return Err(EngineError::Config(
                "pipeline.max_steps must be at least 1".to_string(),
            ));
        }

        for (key, dir) in [
            ("pipeline.docs_dir", &self.pipeline.docs_dir),
            ("pipeline.src_dir", &self.pipeline.src_dir),
        ] {
            if !is_contained_relative(dir) {
                return Err(EngineError::Config(format!(
                    "{} must be a relative path inside the project: {:?}",
                    key, dir
                )));
            }
        }
        if !is_contained_relative(Path::new(&self.pipeline.default_code_file)) {
            return Err(EngineError::Config(format!(
                "pipeline.default_code_file must be a relative path: {}",
                self.pipeline.default_code_file
            )));
        }

        self.core.workspace = expand_path(&self.core.workspace)?;
        self.core.workspace = canonicalize_or_create(&self.core.workspace)?;

        if !self.core.workspace.is_dir() {
            return Err(EngineError::Config(format!(
                "Workspace path is not a directory: {:?}",
                self.core.workspace
            )));
        }

        Ok(())
    }
}

/// True when `path` is relative and never steps above its starting point
fn is_contained_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Canonicalize path, creating it if it doesn't exist
fn canonicalize_or_create(path: &Path) -> Result<PathBuf, EngineError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            EngineError::Config(format!("Failed to create directory {:?}: {}", path, e))
        })?;
    }

    path.canonicalize()
        .map_err(|e| EngineError::PathCanonicalization(path.to_path_buf(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.ollama.model, "llama3.1:8b");
        assert_eq!(config.pipeline.reasoning_tag, "think");
        assert_eq!(config.pipeline.max_project_name_len, 30);
        assert_eq!(config.pipeline.docs_dir, PathBuf::from(".kiro"));
        assert!(config.search.enabled);
        assert!(config.llm.cache);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_contained_relative() {
        assert!(is_contained_relative(Path::new(".kiro")));
        assert!(is_contained_relative(Path::new("src/app")));
        assert!(!is_contained_relative(Path::new("../outside")));
        assert!(!is_contained_relative(Path::new("/etc")));
        assert!(!is_contained_relative(Path::new("")));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.llm.ollama.base_url, deserialized.llm.ollama.base_url);
        assert_eq!(
            config.pipeline.default_code_file,
            deserialized.pipeline.default_code_file
        );
    }

    #[test]
    fn test_rejects_bad_reasoning_tag() {
        let temp = tempfile::TempDir::new().unwrap();
        let toml = format!(
            "[core]\nworkspace = {:?}\n\n[llm]\n\n[pipeline]\nreasoning_tag = \"a b\"\n",
            temp.path()
        );
        let err = Config::load_from_str(&toml).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_rejects_escaping_docs_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let toml = format!(
            "[core]\nworkspace = {:?}\n\n[llm]\n\n[pipeline]\ndocs_dir = \"../docs\"\n",
            temp.path()
        );
        assert!(Config::load_from_str(&toml).is_err());
    }
}
