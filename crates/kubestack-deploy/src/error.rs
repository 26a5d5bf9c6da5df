//! Errors raised while deploying.

use kubestack_common::error::KubestackError;
use kubestack_tfstate::StateError;
use thiserror::Error;

/// A deployment step failed.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Loading, rendering, or local I/O failed.
    #[error(transparent)]
    Common(#[from] KubestackError),

    /// Provisioning state could not be extracted.
    #[error(transparent)]
    State(#[from] StateError),

    /// A cluster CLI invocation exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// A state locator could not be parsed.
    #[error("invalid state locator '{locator}': {reason}")]
    InvalidLocator {
        /// The locator as given.
        locator: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The locator is valid but no fetcher handles its scheme.
    #[error("no fetcher available for state locator '{locator}'")]
    UnsupportedLocator {
        /// The locator as given.
        locator: String,
    },

    /// Fetching remote state failed.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Description of the failure.
        message: String,
    },
}

/// Convenience alias for deployment results.
pub type Result<T> = std::result::Result<T, DeployError>;
