//! Error types for Graph requests.
//!
//! Graph answers failures with a JSON envelope
//! (`{"error": {"code": ..., "message": ...}}`). Those are parsed into
//! [`Error::Graph`] and translated into the engine's taxonomy when they
//! leave the gateway.

use serde::Deserialize;
use std::fmt;

/// Result type alias for Graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message Graph returns when the tenant lacks the feature's license.
pub const NOT_APPLICABLE_TO_TENANT: &str = "Request not applicable to target tenant";

/// Categories of Graph errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors.
    Network,
    /// Missing, expired or rejected token.
    Authentication,
    /// The tenant is not licensed for the feature, or the app lacks consent.
    Authorization,
    /// The addressed object does not exist.
    NotFound,
    /// Graph throttled the request.
    Throttled,
    /// Any other error answered by Graph.
    Remote,
    /// The response could not be decoded.
    Format,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Authentication => "Authentication failed",
            Self::Authorization => "Tenant not licensed or permission missing",
            Self::NotFound => "Object not found",
            Self::Throttled => "Request throttled",
            Self::Remote => "Graph rejected the request",
            Self::Format => "Invalid response format",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::Authentication => "Obtain a fresh access token for the tenant",
            Self::Authorization => {
                "Check the tenant's licenses and the application's Graph permissions"
            }
            Self::NotFound => "The object may have been removed; run get again",
            Self::Throttled => "Wait a moment and run the command again",
            Self::Remote => "Check the error details for more information",
            Self::Format => "The API may have changed; try the other API version",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while calling Graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection context carries no bearer token.
    #[error("no access token for tenant {tenant}")]
    MissingToken {
        /// Tenant the request was for.
        tenant: String,
    },

    /// HTTP request failed before Graph answered.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
    },

    /// Graph answered with a non-success status.
    #[error("Graph returned {status} {code}: {message}")]
    Graph {
        /// HTTP status code.
        status: u16,
        /// Graph error code, e.g. `Forbidden`.
        code: String,
        /// Graph error message.
        message: String,
    },

    /// Invalid response from Graph.
    #[error("invalid Graph response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Build an error from a failed response's status and body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => (String::from("unknown"), body.trim().to_string()),
        };
        Self::Graph {
            status,
            code,
            message,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingToken { .. } => ErrorCategory::Authentication,
            Error::Http { .. } => ErrorCategory::Network,
            Error::Graph {
                status, message, ..
            } => match status {
                401 => ErrorCategory::Authentication,
                403 => ErrorCategory::Authorization,
                404 => ErrorCategory::NotFound,
                429 => ErrorCategory::Throttled,
                _ if message.contains(NOT_APPLICABLE_TO_TENANT) => ErrorCategory::Authorization,
                _ => ErrorCategory::Remote,
            },
            Error::InvalidResponse(_) => ErrorCategory::Format,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Graph {
                status: code,
                code: String::from("unknown"),
                message: format!("HTTP {code}"),
            },
            other => Self::Http {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<Error> for declarative::Error {
    fn from(err: Error) -> Self {
        let category = err.category();
        match (category, err) {
            (_, Error::Http { message }) => Self::Transport { message },
            (_, err @ Error::MissingToken { .. }) => Self::Authentication {
                message: err.to_string(),
            },
            (ErrorCategory::Authentication, err) => Self::Authentication {
                message: err.to_string(),
            },
            (ErrorCategory::Authorization, err) => Self::Authorization {
                message: err.to_string(),
            },
            (_, Error::Graph {
                status,
                code,
                message,
            }) => Self::Api {
                status,
                body: format!("{code}: {message}"),
            },
            (_, Error::InvalidResponse(message)) => Self::mapping("graph", message),
        }
    }
}
