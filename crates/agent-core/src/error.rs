//! Error taxonomy for the gateway.
//!
//! Every failure surfaced to a caller maps onto one of these variants, and
//! every variant carries enough context to produce the caller-facing
//! `{status, message, details}` shape without leaking internals.

use thiserror::Error;

/// Convenience alias for gateway results.
pub type AgentResult<T> = Result<T, AgentError>;

/// All errors produced by the gateway core.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid or incomplete agent configuration (unknown backend, missing
    /// required fields, malformed schema).
    #[error("{message}")]
    Configuration {
        /// Human-readable description of the configuration problem.
        message: String,
    },

    /// A backend that is declared but has no adapter implementation.
    #[error("{backend} service is not yet implemented")]
    NotImplemented {
        /// The backend identifier as configured.
        backend: String,
    },

    /// Unknown agent id or unmapped route path.
    #[error("{message}")]
    NotFound {
        /// What could not be found.
        message: String,
    },

    /// The inbound payload did not have the shape the request schema demands.
    #[error("{reason}")]
    RequestFormat {
        /// Why the payload was rejected.
        reason: String,
    },

    /// A declared request field was missing or had the wrong type.
    #[error("{message}")]
    RequestField {
        /// Name of the offending field.
        field: String,
        /// Full validation message.
        message: String,
    },

    /// The backend's reply did not have the shape the response schema demands
    /// and the adapter's policy is strict.
    #[error("{reason}")]
    ResponseFormat {
        /// Why the reply was rejected.
        reason: String,
    },

    /// A declared response field was missing or had the wrong type.
    #[error("{message}")]
    ResponseField {
        /// Name of the offending field.
        field: String,
        /// Full validation message.
        message: String,
    },

    /// The provider returned a non-2xx reply or the call failed outright.
    #[error("{message}")]
    Provider {
        /// Backend that produced the failure.
        backend: String,
        /// Upstream HTTP status, when one was received.
        status: Option<u16>,
        /// Message extracted from the provider's error envelope.
        message: String,
    },

    /// The configuration store failed.
    #[error("{message}")]
    Store {
        /// Description of the store failure.
        message: String,
    },

    /// Anything else.
    #[error("{message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl AgentError {
    /// Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Unimplemented backend.
    pub fn not_implemented(backend: impl Into<String>) -> Self {
        Self::NotImplemented {
            backend: backend.into(),
        }
    }

    /// Not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Request payload shape error.
    pub fn request_format(reason: impl Into<String>) -> Self {
        Self::RequestFormat {
            reason: reason.into(),
        }
    }

    /// Strict response shape error.
    pub fn response_format(reason: impl Into<String>) -> Self {
        Self::ResponseFormat {
            reason: reason.into(),
        }
    }

    /// Upstream provider error.
    pub fn provider(
        backend: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self::Provider {
            backend: backend.into(),
            status,
            message: message.into(),
        }
    }

    /// Store failure.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Internal failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code this error translates to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration { .. } | Self::RequestFormat { .. } | Self::RequestField { .. } => {
                400
            }
            Self::NotImplemented { .. } => 501,
            Self::NotFound { .. } => 404,
            Self::ResponseFormat { .. } | Self::ResponseField { .. } => 500,
            Self::Provider { status, .. } => status.unwrap_or(500),
            Self::Store { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Whether this error came from request-schema validation (caller fault).
    pub fn is_request_validation(&self) -> bool {
        matches!(
            self,
            Self::RequestFormat { .. } | Self::RequestField { .. }
        )
    }

    /// Whether this error came from response-schema validation (provider
    /// fault).
    pub fn is_response_validation(&self) -> bool {
        matches!(
            self,
            Self::ResponseFormat { .. } | Self::ResponseField { .. }
        )
    }
}
