//! CLI interface for AutoSpec
//!
//! This module provides the command-line interface using clap's derive API.
//! With a query the pipeline runs once; without one, queries are read from
//! stdin until `exit`.

use clap::Parser;
use std::path::PathBuf;

/// AutoSpec
///
/// Turns a feature request into a requirements document, a design, a task
/// list and source code, one stage at a time.
#[derive(Parser, Debug)]
#[command(name = "autospec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Request to process; omit to start an interactive session
    pub query: Option<String>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_query() {
        let cli = Cli::try_parse_from(["autospec", "我需要一个待办事项应用"]).unwrap();
        assert_eq!(cli.query.as_deref(), Some("我需要一个待办事项应用"));
        assert!(cli.config.is_none());
        assert!(cli.log.is_none());
    }

    #[test]
    fn test_cli_parse_interactive() {
        let cli = Cli::try_parse_from(["autospec"]).unwrap();
        assert!(cli.query.is_none());
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::try_parse_from([
            "autospec",
            "--config",
            "/tmp/autospec.toml",
            "--log",
            "debug",
            "build a blog",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/autospec.toml")));
        assert_eq!(cli.log.as_deref(), Some("debug"));
        assert_eq!(cli.query.as_deref(), Some("build a blog"));
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["autospec", "--json"]).is_err());
    }
}
