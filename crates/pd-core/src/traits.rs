//! Core traits for PLRDecomp
//!
//! The scan engine talks to its collaborators only through these traits:
//! a [`ModelProvider`] opens one [`Workspace`] per channel source, and an
//! [`IntervalSolver`] turns a configured [`Model`] plus data into a POI interval.
//! Concrete providers/solvers live in their own crates.

use crate::model::Model;
use crate::params::{Parameter, ParameterSet};
use crate::types::{CurveGrid, IntervalEstimate, SampledCurve};
use crate::Result;

/// Named container of parameter groups, datasets and model configs for one channel.
pub trait Workspace {
    /// Observed dataset type.
    type Data;
    /// Model configuration type.
    type Config;

    /// Workspace name (used in diagnostics).
    fn name(&self) -> &str;

    /// Parameter group by name (`None` if absent).
    fn parameter_set(&self, name: &str) -> Option<&ParameterSet>;

    /// Dataset by name (`None` if absent).
    fn dataset(&self, name: &str) -> Option<&Self::Data>;

    /// Model config by name (`None` if absent).
    fn model_config(&self, name: &str) -> Option<&Self::Config>;

    /// Human-readable listing of the workspace contents.
    fn contents(&self) -> Vec<String>;
}

/// Opens workspaces from channel sources.
pub trait ModelProvider {
    /// Workspace type produced.
    type Workspace: Workspace;

    /// Open workspace `workspace` from `source`.
    ///
    /// Fails with [`crate::Error::MissingResource`] when the source or the workspace
    /// cannot be found.
    fn open(&self, source: &str, workspace: &str) -> Result<Self::Workspace>;
}

/// Inputs of one interval-solver call.
#[derive(Debug)]
pub struct SolveRequest<'a, D, C> {
    /// Observed dataset.
    pub data: &'a D,
    /// Model configuration.
    pub config: &'a C,
    /// Model with pinned values / constant flags applied.
    pub model: &'a Model,
    /// Confidence level in (0, 1).
    pub confidence_level: f64,
}

impl<D, C> SolveRequest<'_, D, C> {
    /// The parameter of interest.
    pub fn poi(&self) -> &Parameter {
        self.model.poi()
    }
}

/// Profile-likelihood interval solver.
pub trait IntervalSolver {
    /// Dataset type accepted.
    type Data;
    /// Model configuration type accepted.
    type Config;

    /// Fit the model and compute the POI interval at the requested confidence level.
    fn solve(&self, request: &SolveRequest<'_, Self::Data, Self::Config>) -> Result<IntervalEstimate>;

    /// Sample the curves behind `estimate` on `grid`.
    ///
    /// Solvers that cannot expose curves return an empty list.
    fn sample_curves(
        &self,
        _request: &SolveRequest<'_, Self::Data, Self::Config>,
        _estimate: &IntervalEstimate,
        _grid: &CurveGrid,
    ) -> Result<Vec<SampledCurve>> {
        Ok(Vec::new())
    }

    /// Solver name (e.g., "gaussian").
    fn name(&self) -> &str;
}
