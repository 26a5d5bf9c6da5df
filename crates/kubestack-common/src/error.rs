//! Unified error types for the kubestack workspace.
//!
//! Structural and semantic validation share one failure type,
//! [`ValidationError`], which always carries the complete list of
//! violations found in a document. Higher-level crates define their own
//! domain-specific error enums and wrap these variants when appropriate.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single violation found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Violation {
    /// JSON pointer to the offending location, `/` for the document root.
    pub path: String,
    /// Human-readable reason.
    pub message: String,
}

impl Violation {
    /// Creates a violation at the given document path.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { "/".into() } else { path },
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A document failed structural or semantic validation.
///
/// Never empty: a validator with nothing to report returns `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Wraps a list of violations, or returns `None` when the list is empty.
    #[must_use]
    pub fn from_violations(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// Wraps exactly one violation.
    #[must_use]
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// Converts a violation list into a validation result.
    ///
    /// # Errors
    ///
    /// Returns the wrapped violations when the list is not empty.
    pub fn check(violations: Vec<Violation>) -> std::result::Result<(), Self> {
        Self::from_violations(violations).map_or(Ok(()), Err)
    }

    /// Returns every violation in the order it was detected.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns the number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s):", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  {violation}")?;
        }
        Ok(())
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum KubestackError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required item was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing item.
        kind: &'static str,
        /// Identifier of the missing item.
        id: String,
    },

    /// The document is not decodable YAML.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The document decoded but is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KubestackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_violation_list_is_not_an_error() {
        assert!(ValidationError::from_violations(Vec::new()).is_none());
        assert!(ValidationError::check(Vec::new()).is_ok());
    }

    #[test]
    fn display_lists_every_violation() {
        let err = ValidationError::check(vec![
            Violation::new("/a", "first"),
            Violation::new("/b/c", "second"),
        ])
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("2 validation error(s):"), "got: {msg}");
        assert!(msg.contains("/a: first"), "got: {msg}");
        assert!(msg.contains("/b/c: second"), "got: {msg}");
    }

    #[test]
    fn empty_path_means_document_root() {
        assert_eq!(Violation::new("", "oops").to_string(), "/: oops");
    }

    #[test]
    fn validation_error_converts_into_workspace_error() {
        let err = ValidationError::check(vec![Violation::new("/x", "bad")]).unwrap_err();
        let wrapped: KubestackError = err.into();
        assert!(matches!(wrapped, KubestackError::Validation(_)));
        assert!(wrapped.to_string().contains("/x: bad"));
    }
}
