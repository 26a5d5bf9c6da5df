//! Locating and fetching provisioning state.
//!
//! A locator is written `terraform:<scheme>://...`, for example
//! `terraform:file:///srv/infra/terraform.tfstate` or
//! `terraform:s3://bucket/path/terraform.tfstate`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use kubestack_common::constants::STATE_LOCATOR_PREFIX;
use kubestack_common::error::KubestackError;

use crate::error::{DeployError, Result};

/// Where provisioning state lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateLocator {
    /// A local file.
    File(PathBuf),
    /// An HTTP(S) URL.
    Http(String),
    /// An object in S3.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },
}

impl FromStr for StateLocator {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| DeployError::InvalidLocator {
            locator: s.to_owned(),
            reason: reason.to_owned(),
        };
        let rest = s
            .strip_prefix(STATE_LOCATOR_PREFIX)
            .ok_or_else(|| invalid("expected a 'terraform:' prefix"))?;

        if let Some(path) = rest.strip_prefix("file://") {
            if path.is_empty() {
                return Err(invalid("empty file path"));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if rest.starts_with("http://") || rest.starts_with("https://") {
            return Ok(Self::Http(rest.to_owned()));
        }
        if let Some(object) = rest.strip_prefix("s3://") {
            return match object.split_once('/') {
                Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Self::S3 {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                }),
                _ => Err(invalid("expected s3://<bucket>/<key>")),
            };
        }
        Err(invalid("unknown scheme, expected file, http, https or s3"))
    }
}

impl fmt::Display for StateLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{STATE_LOCATOR_PREFIX}file://{}", path.display()),
            Self::Http(url) => write!(f, "{STATE_LOCATOR_PREFIX}{url}"),
            Self::S3 { bucket, key } => write!(f, "{STATE_LOCATOR_PREFIX}s3://{bucket}/{key}"),
        }
    }
}

/// Retrieves a provisioning state document.
pub trait StateFetcher: Send + Sync {
    /// Returns the raw document at `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::UnsupportedLocator`] for locators this fetcher
    /// does not handle, or an error if retrieval fails.
    fn fetch(&self, locator: &StateLocator) -> Result<String>;
}

/// Reads `file://` locators from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStateFetcher;

impl StateFetcher for FileStateFetcher {
    fn fetch(&self, locator: &StateLocator) -> Result<String> {
        let StateLocator::File(path) = locator else {
            return Err(unsupported(locator));
        };
        tracing::info!(path = %path.display(), "reading provisioning state");
        std::fs::read_to_string(path).map_err(|e| {
            KubestackError::Io {
                path: path.clone(),
                source: e,
            }
            .into()
        })
    }
}

/// Downloads `http(s)://` locators.
#[derive(Debug, Clone, Default)]
pub struct HttpStateFetcher {
    client: reqwest::blocking::Client,
}

impl StateFetcher for HttpStateFetcher {
    fn fetch(&self, locator: &StateLocator) -> Result<String> {
        let StateLocator::Http(url) = locator else {
            return Err(unsupported(locator));
        };
        tracing::info!(%url, "downloading provisioning state");
        let fetch_error = |message: String| DeployError::Fetch {
            url: url.clone(),
            message,
        };
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }
        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}

/// Handles file and HTTP locators, delegating S3 to an optional
/// caller-supplied fetcher.
#[derive(Default)]
pub struct DefaultStateFetcher {
    file: FileStateFetcher,
    http: HttpStateFetcher,
    s3: Option<Box<dyn StateFetcher>>,
}

impl DefaultStateFetcher {
    /// Returns a copy that fetches S3 locators with `fetcher`.
    #[must_use]
    pub fn with_s3(mut self, fetcher: Box<dyn StateFetcher>) -> Self {
        self.s3 = Some(fetcher);
        self
    }
}

impl StateFetcher for DefaultStateFetcher {
    fn fetch(&self, locator: &StateLocator) -> Result<String> {
        match locator {
            StateLocator::File(_) => self.file.fetch(locator),
            StateLocator::Http(_) => self.http.fetch(locator),
            StateLocator::S3 { .. } => self
                .s3
                .as_ref()
                .ok_or_else(|| unsupported(locator))?
                .fetch(locator),
        }
    }
}

fn unsupported(locator: &StateLocator) -> DeployError {
    DeployError::UnsupportedLocator {
        locator: locator.to_string(),
    }
}
