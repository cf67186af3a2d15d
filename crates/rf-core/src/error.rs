//! Unified error type for collaborator and infrastructure failures.
//!
//! Every collaborator (HTTP provider, external tool wrapper) reports failures
//! as an [`Error`]. The orchestrator wraps it in a stage-specific
//! `PipelineError`, so the variants here describe *what* went wrong, not
//! *where* in the pipeline.

/// Unified error type covering all collaborator failure modes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration or input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A remote service (Reddit, Google, AssemblyAI, YouTube) rejected or
    /// failed a request.
    #[error("Remote error [{service}]: {message}")]
    Remote {
        /// Name of the remote service.
        service: String,
        /// Human-readable error description.
        message: String,
    },

    /// The content source had nothing to offer.
    #[error("No content available from {source_name}")]
    NoContent {
        /// Name of the source that came back empty.
        source_name: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Remote`].
    pub fn remote(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Remote {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::NoContent`].
    pub fn no_content(source_name: impl Into<String>) -> Self {
        Error::NoContent {
            source_name: source_name.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
