//! Error types for binding setup and expression evaluation.
//!
//! Two families with opposite propagation rules:
//!
//! - Authoring, structural and conflict errors indicate a bug in the bound
//!   markup or data shape. They are never caught internally and abort
//!   [`bootstrap`](crate::binder::bootstrap).
//! - Evaluation errors are a runtime condition (missing nested field, type
//!   mismatch against live data). They are always caught at the innermost
//!   call site, reported through `tracing`, and masked behind a safe
//!   fallback at the UI boundary.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BindError>;

/// Errors raised by the binding engine.
#[derive(Debug, Error)]
pub enum BindError {
    /// Malformed expression text. Indicates an authoring bug, not a runtime
    /// condition, so it surfaces immediately from binding setup.
    #[error("invalid expression `{expression}`: {detail}")]
    Authoring { expression: String, detail: String },

    /// An error raised while evaluating a compiled expression against live
    /// data. Recoverable: the call site substitutes a fallback value.
    #[error("evaluation of `{expression}` failed: {detail}")]
    Evaluation { expression: String, detail: String },

    /// A collection (or other unsupported value shape) where a scalar or
    /// nested object is required. Collection reactivity is out of scope.
    #[error("unsupported structure: {0}")]
    UnsupportedStructure(String),

    /// Two directives on one element claim the same target property.
    #[error("conflicting binding directives target element property `{property}`")]
    Conflict { property: String },
}

impl BindError {
    /// Build an authoring error for `expression`.
    pub(crate) fn authoring(expression: &str, detail: impl Into<String>) -> Self {
        Self::Authoring {
            expression: expression.to_string(),
            detail: detail.into(),
        }
    }

    /// Build an evaluation error for `expression`.
    pub(crate) fn evaluation(expression: &str, detail: impl Into<String>) -> Self {
        Self::Evaluation {
            expression: expression.to_string(),
            detail: detail.into(),
        }
    }

    /// True for the recoverable family (absorbed by the runtime path).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Evaluation { .. })
    }
}
