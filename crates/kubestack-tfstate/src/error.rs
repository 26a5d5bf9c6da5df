//! Errors raised while extracting provisioning state.
//!
//! Only document-level problems are errors. Per-resource problems are
//! skips, counted in the extraction report.

use thiserror::Error;

/// A state document could not be extracted.
#[derive(Debug, Error)]
pub enum StateError {
    /// The document is not valid state JSON.
    #[error("malformed state document: {source}")]
    Malformed {
        /// Underlying decode error.
        #[from]
        source: serde_json::Error,
    },

    /// The document uses a state format version this extractor cannot read.
    #[error("unsupported state version {version}, expected {expected}")]
    UnsupportedVersion {
        /// Version found in the document.
        version: u64,
        /// Version this extractor reads.
        expected: u64,
    },

    /// The requested application has no resources in the state.
    #[error("application '{name}' not found in state")]
    ApplicationNotFound {
        /// Requested application name.
        name: String,
    },

    /// No application was requested and the state does not hold exactly one.
    #[error("cannot choose an application: state holds {}", describe(.available))]
    AmbiguousApplication {
        /// Applications present in the state.
        available: Vec<String>,
    },
}

fn describe(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_owned()
    } else {
        available.join(", ")
    }
}

/// Convenience alias for extraction results.
pub type Result<T> = std::result::Result<T, StateError>;
