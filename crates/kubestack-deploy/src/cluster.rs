//! Cluster access through the `kubectl` command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use kubestack_common::error::KubestackError;
use kubestack_render::{ObjectKind, RenderedObject};

use crate::error::{DeployError, Result};

/// Idempotent apply and delete against a cluster, addressed by kind and
/// name.
pub trait ClusterClient: Send + Sync {
    /// Creates or updates an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster rejects the object.
    fn apply(&self, object: &RenderedObject) -> Result<()>;

    /// Deletes one object; deleting an absent object succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    fn delete(&self, kind: ObjectKind, name: &str) -> Result<()>;

    /// Deletes every object of a kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    fn delete_all(&self, kind: ObjectKind) -> Result<()>;
}

/// Resolves a human-facing URL for a deployed service.
pub trait AddressResolver: Send + Sync {
    /// Returns the URL of `service`, or `None` if it is not reachable from
    /// outside the cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster cannot be queried.
    fn service_url(&self, service: &str) -> Result<Option<String>>;
}

/// [`ClusterClient`] backed by the `kubectl` binary.
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    context: Option<String>,
}

impl Kubectl {
    /// Creates a client for an explicit binary path.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, context: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            context,
        }
    }

    /// Looks `binary` up on `$PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`KubestackError::NotFound`] if the binary cannot be found.
    pub fn locate(binary: &str, context: Option<String>) -> Result<Self> {
        let path = which::which(binary).map_err(|_| KubestackError::NotFound {
            kind: "cluster CLI binary",
            id: binary.to_owned(),
        })?;
        tracing::debug!(path = %path.display(), "found cluster CLI");
        Ok(Self::new(path, context))
    }

    /// Returns the binary this client runs.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut all: Vec<String> = self
            .context
            .iter()
            .map(|c| format!("--context={c}"))
            .collect();
        all.extend(args.iter().map(|a| (*a).to_owned()));
        all
    }

    /// Runs the binary with `args`, feeding `stdin` if given, and returns
    /// its standard output.
    fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String> {
        let args = self.command_args(args);
        let command_line = format!("{} {}", self.binary.display(), args.join(" "));
        tracing::debug!(command = %command_line, "running cluster CLI");

        let io_error = |source| KubestackError::Io {
            path: self.binary.clone(),
            source,
        };
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io_error)?;
        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).map_err(io_error)?;
        }
        let output = child.wait_with_output().map_err(io_error)?;

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn jsonpath(&self, args: &[&str], path: &str) -> Result<String> {
        let output = format!("jsonpath={path}");
        let mut all = args.to_vec();
        all.extend(["-o", output.as_str()]);
        Ok(self.run(&all, None)?.trim().to_owned())
    }
}

impl ClusterClient for Kubectl {
    fn apply(&self, object: &RenderedObject) -> Result<()> {
        let manifest = serde_yaml::to_string(&object.to_manifest()).map_err(KubestackError::from)?;
        let _ = self.run(&["apply", "-f", "-"], Some(&manifest))?;
        tracing::info!(object = %object.key(), "applied");
        Ok(())
    }

    fn delete(&self, kind: ObjectKind, name: &str) -> Result<()> {
        let _ = self.run(&["delete", kind.cli_name(), name, "--ignore-not-found"], None)?;
        tracing::info!(kind = kind.cli_name(), name, "deleted");
        Ok(())
    }

    fn delete_all(&self, kind: ObjectKind) -> Result<()> {
        let _ = self.run(&["delete", kind.cli_name(), "--all"], None)?;
        tracing::info!(kind = kind.cli_name(), "deleted all");
        Ok(())
    }
}

impl AddressResolver for Kubectl {
    fn service_url(&self, service: &str) -> Result<Option<String>> {
        let port = self.jsonpath(&["get", "service", service], "{.spec.ports[0].nodePort}")?;
        if port.is_empty() {
            return Ok(None);
        }
        let host = self.jsonpath(
            &["get", "nodes"],
            "{.items[0].status.addresses[?(@.type==\"InternalIP\")].address}",
        )?;
        if host.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!("http://{host}:{port}")))
    }
}
