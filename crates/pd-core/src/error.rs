//! Error types for PLRDecomp

use std::fmt;

use thiserror::Error;

/// Kind of named object that a model provider failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Input file / channel source.
    File,
    /// Workspace inside a source.
    Workspace,
    /// Observed dataset inside a workspace.
    Dataset,
    /// Model configuration object inside a workspace.
    ModelConfig,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::File => "file",
            ResourceKind::Workspace => "workspace",
            ResourceKind::Dataset => "data",
            ResourceKind::ModelConfig => "ModelConfig",
        };
        f.write_str(s)
    }
}

/// PLRDecomp error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// A named model, dataset or model config could not be resolved.
    #[error("{kind} '{name}' is not found in {origin}")]
    MissingResource {
        /// What was looked up.
        kind: ResourceKind,
        /// Name used for the lookup.
        name: String,
        /// Where it was looked up (file path or workspace name).
        origin: String,
    },

    /// One or more required parameter groups are absent or empty.
    #[error("workspace '{workspace}' is missing parameter groups: {}", missing.join(", "))]
    IncompleteModel {
        /// Workspace name.
        workspace: String,
        /// Group names that are absent or empty.
        missing: Vec<String>,
    },
}

impl Error {
    /// Shorthand for [`Error::MissingResource`].
    pub fn missing(kind: ResourceKind, name: impl Into<String>, origin: impl Into<String>) -> Self {
        Error::MissingResource { kind, name: name.into(), origin: origin.into() }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
