//! Pipeline stages, artifacts, and artifact naming.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ids::RunId;

/// One of the six pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Synthesize,
    Compose,
    Transcribe,
    Caption,
    Publish,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Fetch,
        Stage::Synthesize,
        Stage::Compose,
        Stage::Transcribe,
        Stage::Caption,
        Stage::Publish,
    ];

    /// Stable lowercase name, used in logs, file names and API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Synthesize => "synthesize",
            Stage::Compose => "compose",
            Stage::Transcribe => "transcribe",
            Stage::Caption => "caption",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file produced by one stage of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub run_id: RunId,
    pub stage: Stage,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(run_id: RunId, stage: Stage, path: PathBuf) -> Self {
        Self {
            run_id,
            stage,
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Builds run identities and artifact paths under a fixed output root.
///
/// Paths have the shape `<root>/<run_id>_<stage>.<ext>`, e.g.
/// `generated/20261019_143005_9f1c2ab4_compose.mp4`, so a directory listing
/// groups artifacts by run and orders runs by start time. The namer never
/// touches the filesystem.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    root: PathBuf,
}

impl ArtifactNamer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root all artifact paths live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mint the identity for a run starting now.
    pub fn new_run_id(&self) -> RunId {
        RunId::new()
    }

    /// Path of the artifact `stage` writes for `run_id`.
    ///
    /// A leading dot on `extension` is ignored.
    pub fn path_for(&self, run_id: &RunId, stage: Stage, extension: &str) -> PathBuf {
        let extension = extension.trim_start_matches('.');
        self.root
            .join(format!("{}_{}.{}", run_id, stage.as_str(), extension))
    }
}
