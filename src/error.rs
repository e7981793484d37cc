//! Error types surfaced by the validation core.
//!
//! Every variant corresponds to one of the protocol's named error kinds.
//! These are client-request errors: they are never retried or recovered
//! internally, and an outer transport layer maps them to HTTP statuses.

/// Typed validation error carrying a contextual message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScimError {
    /// The filter text violates the grammar or a value-path restriction
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The request body is structurally malformed (e.g. missing value)
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),

    /// The path does not resolve to a known attribute
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The supplied value does not match the attribute definition
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A remove operation named no target
    #[error("No target: {0}")]
    NoTarget(String),

    /// The operation writes an attribute its mutability forbids
    #[error("Mutability violation: {0}")]
    Mutability(String),

    /// Replace of an immutable attribute (legacy kind mapping)
    #[error("Uniqueness violation: {0}")]
    Uniqueness(String),

    /// A lookup matched more than one target
    #[error("Too many targets: {0}")]
    TooMany(String),
}

impl ScimError {
    /// Create an invalid-path error with context.
    pub fn invalid_path<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create an invalid-value error with context.
    pub fn invalid_value<S: Into<String>>(msg: S) -> Self {
        Self::InvalidValue(msg.into())
    }

    /// The wire-level `scimType` keyword for this error kind.
    pub fn scim_type(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) => "invalidFilter",
            Self::InvalidSyntax(_) => "invalidSyntax",
            Self::InvalidPath(_) => "invalidPath",
            Self::InvalidValue(_) => "invalidValue",
            Self::NoTarget(_) => "noTarget",
            Self::Mutability(_) => "mutability",
            Self::Uniqueness(_) => "uniqueness",
            Self::TooMany(_) => "tooMany",
        }
    }
}
