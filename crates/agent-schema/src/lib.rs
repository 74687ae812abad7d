//! # Agent Schema
//!
//! The schema validation engine for the LLM Agent Gateway, plus the
//! JSON-repair helpers the provider adapters use to dig structured data out
//! of loosely formatted model replies.
//!
//! The validator is a pure function over the declarative [`agent_core::Schema`]
//! model: it checks and coerces untyped payloads, with different severities on
//! the request and response sides (a malformed request is the caller's fault;
//! a malformed reply is preserved for debugging rather than discarded).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod repair;
pub mod validator;

pub use repair::{
    extract_fenced_block, fallback_envelope, is_fallback_envelope, parse_loose,
    strip_nested_fences, unwrap_quoted,
};
pub use validator::{validate_request, validate_response};
