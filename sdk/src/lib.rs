//! AutoSpec SDK
//!
//! Shared library providing the error taxonomy and the external tool contract
//! used by the AutoSpec engine and by anything that plugs tools into it.

/// Error types and handling
pub mod errors;

/// External tool trait and descriptor types
pub mod tool;

// Re-export commonly used types
pub use errors::{EngineError, ErrorExt};
pub use tool::{Tool, ToolSpec};
