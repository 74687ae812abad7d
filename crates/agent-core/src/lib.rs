//! # Agent Core
//!
//! Core types and error handling for the LLM Agent Gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - The agent configuration model (`AgentConfig` and its schemas)
//! - The backend identifier enum
//! - The error taxonomy with HTTP status mapping

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AgentError, AgentResult};
pub use types::{
    AgentConfig, AgentUpdate, Backend, Credential, FieldSpec, FieldType, NewAgent, Schema,
    SchemaKind,
};
