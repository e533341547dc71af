//! Error types for reconciliation operations.
//!
//! Remote failures are folded into read outcomes, set outcomes and export
//! warnings by the components that observe them. Callers see them as `Err`
//! only from planning and from `export_states`.

use std::fmt;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Desired state violates the resource schema.
    Validation,
    /// The remote service could not be reached or rejected our credentials.
    Transport,
    /// The tenant is not licensed for the feature.
    Authorization,
    /// The remote service answered with an error or an unexpected shape.
    Remote,
    /// A resource definition is broken.
    Internal,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid desired state",
            Self::Transport => "Could not reach the tenant",
            Self::Authorization => "Feature not available for tenant",
            Self::Remote => "Remote API error",
            Self::Internal => "Invalid resource definition",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Validation => "Fix the field value in the desired state document",
            Self::Transport => "Check connectivity and that the access token is valid",
            Self::Authorization => "Verify the tenant license and the app's Graph permissions",
            Self::Remote => "Check the error details returned by the service",
            Self::Internal => "This is a bug in the resource definition",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while reconciling a resource.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A desired field is outside its declared constraint.
    #[error("invalid value for {resource}.{field}: {reason}")]
    Validation {
        /// Resource type name.
        resource: String,
        /// Field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Network failure reaching the remote service.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The remote service rejected the credentials.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Error message.
        message: String,
    },

    /// The tenant lacks the license or feature backing the resource.
    #[error("not authorized: {message}")]
    Authorization {
        /// Error message.
        message: String,
    },

    /// The remote service answered with a non-success status.
    #[error("remote API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A remote object could not be mapped into the resource record.
    #[error("cannot map remote object for {resource}: {message}")]
    Mapping {
        /// Resource type name.
        resource: String,
        /// What was missing or malformed.
        message: String,
    },

    /// The resource descriptor itself is inconsistent.
    #[error("invalid descriptor for {resource}: {message}")]
    Descriptor {
        /// Resource type name.
        resource: String,
        /// What is wrong with it.
        message: String,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(
        resource: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            resource: resource.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a mapping error.
    pub fn mapping(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a descriptor error.
    pub fn descriptor(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Transport { .. } | Error::Authentication { .. } => ErrorCategory::Transport,
            Error::Authorization { .. } => ErrorCategory::Authorization,
            Error::Api { .. } | Error::Mapping { .. } => ErrorCategory::Remote,
            Error::Descriptor { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether this error means the tenant lacks the feature.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::validation("R", "Limit", "out of range").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            Error::Transport {
                message: "dns".into()
            }
            .category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::Authentication {
                message: "expired".into()
            }
            .category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::Api {
                status: 500,
                body: String::new()
            }
            .category(),
            ErrorCategory::Remote
        );
        assert_eq!(
            Error::descriptor("R", "no key").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_is_authorization() {
        let err = Error::Authorization {
            message: "Request not applicable to target tenant".into(),
        };
        assert!(err.is_authorization());
        assert!(!Error::mapping("R", "missing id").is_authorization());
    }

    #[test]
    fn test_validation_display_names_field() {
        let err = Error::validation(
            "IntuneDeviceEnrollmentLimitRestriction",
            "Limit",
            "16 is outside 1..=15",
        );
        let msg = err.to_string();
        assert!(msg.contains("IntuneDeviceEnrollmentLimitRestriction.Limit"));
        assert!(msg.contains("1..=15"));
    }

    #[test]
    fn test_category_advice_not_empty() {
        for category in [
            ErrorCategory::Validation,
            ErrorCategory::Transport,
            ErrorCategory::Authorization,
            ErrorCategory::Remote,
            ErrorCategory::Internal,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
    }
}
