//! rf-core: shared types, errors, configuration, and artifact naming.
//!
//! This crate is the foundational dependency for all other rf-* crates. It
//! provides the unified error type, the TOML configuration model, the
//! per-run identity ([`RunId`]) and the [`ArtifactNamer`] that turns a run
//! identity and a stage name into a file path under the output root.

pub mod artifact;
pub mod config;
pub mod content;
pub mod error;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use artifact::{Artifact, ArtifactNamer, Stage};
pub use content::{ContentItem, PublishMetadata, PublishReceipt};
pub use error::{Error, Result};
pub use ids::RunId;
