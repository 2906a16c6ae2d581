//! Per-bake report of what was written, skipped, and failed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Final state of one bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BakeState {
    /// The whole schedule ran.
    Done,
    /// The bake stopped on a configuration or runtime error.
    Failed,
}

/// How a single pass (or pass × light) ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "cause")]
pub enum PassStatus {
    Succeeded,
    /// Not rendered, e.g. the shader could not be resolved.
    Skipped(String),
    /// Rendered but not written.
    Failed(String),
}

/// Outcome of one pass, or one light of a per-light pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassOutcome {
    /// Pass label.
    pub label: String,
    /// Isolated light, for per-light passes.
    pub light: Option<String>,
    /// Destination file, once known.
    pub path: Option<PathBuf>,
    pub status: PassStatus,
}

impl PassOutcome {
    pub(crate) fn succeeded(label: &str, light: Option<&str>, path: PathBuf) -> Self {
        Self {
            label: label.to_string(),
            light: light.map(str::to_string),
            path: Some(path),
            status: PassStatus::Succeeded,
        }
    }

    pub(crate) fn skipped(label: &str, cause: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            light: None,
            path: None,
            status: PassStatus::Skipped(cause.into()),
        }
    }

    pub(crate) fn failed(
        label: &str,
        light: Option<&str>,
        path: Option<PathBuf>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            label: label.to_string(),
            light: light.map(str::to_string),
            path,
            status: PassStatus::Failed(cause.into()),
        }
    }

    /// Whether the output file was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == PassStatus::Succeeded
    }
}

/// Everything one bake produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BakeResult {
    /// Camera baked.
    pub camera: String,
    pub state: BakeState,
    /// Pass outcomes in execution order.
    pub passes: Vec<PassOutcome>,
    /// Why the bake failed, if it did.
    pub error: Option<String>,
}

impl BakeResult {
    /// Passes whose file was written.
    pub fn succeeded(&self) -> impl Iterator<Item = &PassOutcome> {
        self.passes.iter().filter(|p| p.is_success())
    }

    /// Passes that were not rendered.
    pub fn skipped(&self) -> impl Iterator<Item = &PassOutcome> {
        self.passes
            .iter()
            .filter(|p| matches!(p.status, PassStatus::Skipped(_)))
    }

    /// Passes that rendered but could not be written.
    pub fn failed(&self) -> impl Iterator<Item = &PassOutcome> {
        self.passes
            .iter()
            .filter(|p| matches!(p.status, PassStatus::Failed(_)))
    }

    /// Every file written, in order.
    #[must_use]
    pub fn written_files(&self) -> Vec<&Path> {
        self.succeeded().filter_map(|p| p.path.as_deref()).collect()
    }

    /// The bake completed and every pass was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == BakeState::Done && self.passes.iter().all(PassOutcome::is_success)
    }

    /// The bake aborted or some pass failed. Skipped passes are not failures.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.state == BakeState::Failed || self.failed().next().is_some()
    }

    /// Outcome for `label`, and `light` for per-light passes.
    #[must_use]
    pub fn outcome(&self, label: &str, light: Option<&str>) -> Option<&PassOutcome> {
        self.passes
            .iter()
            .find(|p| p.label == label && p.light.as_deref() == light)
    }
}

impl fmt::Display for BakeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "camera '{}': {:?}, {} written, {} skipped, {} failed",
            self.camera,
            self.state,
            self.succeeded().count(),
            self.skipped().count(),
            self.failed().count()
        )?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}
