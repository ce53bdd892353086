//! # pd-core
//!
//! Core types and traits for PLRDecomp.
//!
//! This crate defines the data contracts shared by the scan engine, the
//! model providers and the reporting artifacts:
//! - [`Parameter`] / [`ParameterSet`]: named parameter state with explicit lookup
//! - [`Model`]: the four parameter groups a scannable model needs
//! - [`IntervalSolver`], [`ModelProvider`], [`Workspace`]: collaborator seams
//! - [`FitResult`]: per-channel uncertainty decomposition

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod model;
pub mod params;
pub mod traits;
pub mod types;

pub use error::{Error, ResourceKind, Result};
pub use model::Model;
pub use params::{Parameter, ParameterSet};
pub use traits::{IntervalSolver, ModelProvider, SolveRequest, Workspace};
pub use types::{
    CurveGrid, CurveKind, CurvePoint, FitResult, IntervalEstimate, NamedCurve, ResourceNames,
    SampledCurve, ScanDiagnostic,
};

/// PLRDecomp version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
