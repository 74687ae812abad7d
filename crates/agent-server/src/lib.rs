//! # Agent Server
//!
//! HTTP surface of the LLM Agent Gateway.
//!
//! This crate provides:
//! - Axum-based HTTP server with graceful shutdown
//! - Agent CRUD endpoints under `/api/agents`
//! - Agent execution by id and by operator-chosen dynamic route
//! - The execution pipeline tying validation, dispatch, and routing together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod executor;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use config::AppConfig;
pub use error::ApiError;
pub use executor::Executor;
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;
