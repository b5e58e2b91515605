// Error types for the Gantry pipeline

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single field-level validation violation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldViolation {
    /// Field or parameter name that failed validation
    pub field: String,

    /// Error message
    pub message: String,

    /// Validation constraint that failed
    pub constraint: String,

    /// Value that failed validation (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldViolation {
    /// Create a new violation
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            constraint: "custom".to_string(),
            value: None,
        }
    }

    /// Set the constraint name
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }

    /// Set the invalid value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Payload carried by `Error::Validation`: a summary plus the field-level
/// violations collected by the failing pipe.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub message: String,
    pub violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    /// Create an empty failure with a summary message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Shorthand for a failure carrying exactly one violation
    pub fn of(violation: FieldViolation) -> Self {
        Self {
            message: "Validation failed".to_string(),
            violations: vec![violation],
        }
    }

    /// Add a violation
    pub fn with_violation(mut self, violation: FieldViolation) -> Self {
        self.violations.push(violation);
        self
    }

    /// Render as a structured detail payload
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "violations": self.violations,
        })
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} violation(s))", self.message, self.violations.len())
    }
}

/// Failure raised by any pipeline stage.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(ValidationFailure),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a validation failure on a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(ValidationFailure::of(FieldViolation::new(field, message)))
    }

    /// Get the kind of this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Upstream(_) => ErrorKind::Upstream,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the status hint for this failure
    pub fn status_code(&self) -> u16 {
        self.kind().status_hint()
    }

    /// Whether the failure maps to a 5xx status hint
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// The kind of a failure, used for filter selection and status hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    Validation,
    Upstream,
    Timeout,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Stable name for logging and response detail
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::Validation => "Validation",
            ErrorKind::Upstream => "Upstream",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Internal => "Internal",
        }
    }

    /// Status hint handed to the response sink
    pub fn status_hint(&self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::Validation => 400,
            ErrorKind::Upstream => 502,
            ErrorKind::Timeout => 504,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Generic, kind-derived message used when no filter forwards detail
    pub fn safe_message(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Authentication is required",
            ErrorKind::Forbidden => "Access denied",
            ErrorKind::Validation => "Validation failed",
            ErrorKind::Upstream => "An upstream failure occurred",
            ErrorKind::Timeout => "The request timed out",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Internal => "An internal error occurred",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
