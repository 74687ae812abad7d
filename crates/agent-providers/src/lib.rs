//! # Agent Providers
//!
//! LLM backend adapter implementations for the LLM Agent Gateway.
//!
//! Each adapter hides one provider protocol behind the common
//! [`LlmBackend`] capability contract:
//! - OpenAI chat completions (`ChatGPT`)
//! - Anthropic messages (`Claude`)
//! - Google Gemini generateContent (`Gemini`)
//! - Deepseek chat completions (`Deepseek`)
//!
//! Adapters differ only in wire format, endpoint, auth convention, and their
//! JSON parse-failure policy; prompt composition and reply decoding are
//! shared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod backend;
pub mod deepseek;
pub mod google;
pub mod openai;
pub mod prompt;
pub mod registry;

// Re-export main types
pub use anthropic::{ClaudeBackend, ClaudeConfig};
pub use backend::{LlmBackend, ParsePolicy};
pub use deepseek::{DeepseekBackend, DeepseekConfig};
pub use google::{GeminiBackend, GeminiConfig};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use registry::{BackendRegistry, BackendSettings};
