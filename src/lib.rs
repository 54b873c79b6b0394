//! Docsite Library
//!
//! Markdown documentation server with stateless LLM access tokens.
//! Exposes the internal modules for the binaries and the e2e tests.

pub mod cli_style;
pub mod config;
pub mod content;
pub mod dev;
pub mod llm_tokens;
pub mod mcp;
pub mod server;

// Re-export commonly used types for convenience
pub use content::{ContentCache, ContentError};
pub use llm_tokens::LlmTokenRuntime;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig, Templates};
