//! # pd-workspace
//!
//! JSON model provider for PLRDecomp.
//!
//! A workspace file carries named workspaces; each workspace declares its
//! variables, the parameter groups built from them, observed datasets and
//! Gaussian model configurations.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// File-backed [`pd_core::ModelProvider`].
pub mod provider;
/// Workspace JSON schema types.
pub mod schema;
/// Validated in-memory workspace.
pub mod workspace;


pub use provider::{JsonModelProvider, read_workspace_file};
pub use schema::*;
pub use workspace::{Dataset, GaussianModelConfig, JsonWorkspace};
