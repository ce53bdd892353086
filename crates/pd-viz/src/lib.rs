//! # pd-viz
//!
//! Report artifacts for PLRDecomp.
//!
//! Numbers-first: every artifact is a plot- or table-friendly JSON structure
//! (arrays instead of nested objects). Rendering is left to downstream tools.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Artifact metadata.
pub mod meta;

/// Likelihood curve artifacts (per channel and combined).
pub mod profile;

/// Post-fit nuisance pull artifacts.
pub mod pulls;

/// Cross-channel summary artifact.
pub mod summary;

/// Uncertainty breakdown table (structured + LaTeX).
pub mod table;

pub use meta::ArtifactMeta;
pub use profile::{LabelledCurve, LikelihoodCurveArtifact};
pub use pulls::{PullEntry, PullsArtifact};
pub use summary::{BreakdownSummaryArtifact, caption};
pub use table::{BreakdownTable, TableRow};
