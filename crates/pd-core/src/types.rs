//! Common data types for PLRDecomp

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::ParameterSet;

/// Names used to look up objects and parameter groups inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceNames {
    /// Workspace name inside each source.
    pub workspace: String,
    /// Observed dataset name.
    pub dataset: String,
    /// Model configuration object name.
    pub model_config: String,
    /// Observables group.
    pub observables: String,
    /// Parameters-of-interest group.
    pub poi: String,
    /// Nuisance parameters group.
    pub nuisances: String,
    /// Global observables group.
    pub global_observables: String,
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self {
            workspace: "w".to_string(),
            dataset: "data_obs".to_string(),
            model_config: "ModelConfig".to_string(),
            observables: "observables".to_string(),
            poi: "POI".to_string(),
            nuisances: "nuisances".to_string(),
            global_observables: "globalObservables".to_string(),
        }
    }
}

/// Discriminator for curves exposed by an interval solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Profile negative log-likelihood ratio `-log λ(x)` of the POI.
    ProfileNll,
    /// Horizontal line at the interval threshold.
    Threshold,
    /// Vertical marker at an interval bound.
    IntervalMarker,
}

/// One sampled `(x, y)` point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Abscissa (POI value).
    pub x: f64,
    /// Ordinate.
    pub y: f64,
}

/// Curve produced by an interval solver, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledCurve {
    /// What the curve represents.
    pub kind: CurveKind,
    /// Solver-side name.
    pub name: String,
    /// Ordered points.
    pub points: Vec<CurvePoint>,
}

/// Plain likelihood curve handed to reporting, labelled by step or channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCurve {
    /// Step label (`total`, `stat`) or channel tag.
    pub label: String,
    /// Ordered points.
    pub points: Vec<CurvePoint>,
}

/// Sampling grid for likelihood curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    /// First x value.
    pub x_min: f64,
    /// Last x value.
    pub x_max: f64,
    /// Number of points (inclusive of both ends).
    pub n_points: usize,
}

impl CurveGrid {
    /// Points per curve.
    pub const DEFAULT_POINTS: usize = 200;

    /// `[0, 3]`, widened to `[0, 6]` when the upper limit lies beyond 3.
    pub fn for_upper_limit(upper: f64) -> Self {
        let x_max = if upper > 3.0 { 6.0 } else { 3.0 };
        Self { x_min: 0.0, x_max, n_points: Self::DEFAULT_POINTS }
    }

    /// Grid abscissae.
    pub fn xs(&self) -> Vec<f64> {
        match self.n_points {
            0 => Vec::new(),
            1 => vec![self.x_min],
            n => {
                let step = (self.x_max - self.x_min) / (n - 1) as f64;
                (0..n).map(|i| self.x_min + step * i as f64).collect()
            }
        }
    }
}

/// Output of a single interval-solver call.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalEstimate {
    /// Best-fit POI value.
    pub point_estimate: f64,
    /// Lower interval bound.
    pub lower_limit: f64,
    /// Upper interval bound.
    pub upper_limit: f64,
    /// Parabolic POI error.
    pub parameter_error: f64,
    /// Nuisance parameters after the fit (values and errors).
    pub post_fit_nuisances: ParameterSet,
}

/// Non-fatal condition noted while scanning a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanDiagnostic {
    /// Zero-width interval replaced by the symmetric relative-error interval.
    DegenerateInterval {
        /// Step label.
        step: String,
        /// Relative error used for the substitute interval.
        relative_error: f64,
    },
    /// Per-source relative error below the statistical one; contribution clamped to 0.
    InconsistentDecomposition {
        /// Nuisance name.
        source: String,
        /// `relErr_i^2 - stat^2` before clamping.
        radicand: f64,
    },
    /// Statistical-only uncertainty larger than the total uncertainty.
    StatExceedsTotal {
        /// Statistical relative uncertainty.
        statistical: f64,
        /// Total relative uncertainty.
        total: f64,
    },
}

/// Per-channel result of the full nuisance scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Baseline POI point estimate.
    pub point_estimate: f64,
    /// Baseline lower interval bound.
    pub interval_lower: f64,
    /// Baseline upper interval bound.
    pub interval_upper: f64,
    /// Total relative uncertainty (baseline).
    pub total_relative_uncertainty: f64,
    /// Statistical-only relative uncertainty (all nuisances fixed).
    pub statistical_relative_uncertainty: f64,
    /// Relative uncertainty per nuisance source.
    pub per_source_uncertainty: BTreeMap<String, f64>,
    /// Post-fit nuisance values keyed by display name.
    pub post_fit_nuisance_values: BTreeMap<String, f64>,
    /// Non-fatal conditions noted during the scan.
    #[serde(default)]
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl FitResult {
    /// Quadrature sum of statistical and per-source relative uncertainties.
    pub fn quadrature_total(&self) -> f64 {
        let sys: f64 = self.per_source_uncertainty.values().map(|u| u * u).sum();
        (sys + self.statistical_relative_uncertainty.powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_curve_grid_range() {
        let g = CurveGrid::for_upper_limit(1.2);
        assert_eq!(g.x_max, 3.0);
        let g = CurveGrid::for_upper_limit(3.5);
        assert_eq!(g.x_max, 6.0);

        let xs = g.xs();
        assert_eq!(xs.len(), 200);
        assert_abs_diff_eq!(xs[0], 0.0);
        assert_abs_diff_eq!(xs[199], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quadrature_total() {
        let mut per_source = BTreeMap::new();
        per_source.insert("a".to_string(), 0.3);
        let fr = FitResult {
            point_estimate: 1.0,
            interval_lower: 0.5,
            interval_upper: 1.5,
            total_relative_uncertainty: 0.5,
            statistical_relative_uncertainty: 0.4,
            per_source_uncertainty: per_source,
            post_fit_nuisance_values: BTreeMap::new(),
            diagnostics: Vec::new(),
        };
        assert_abs_diff_eq!(fr.quadrature_total(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_diagnostic_json_tag() {
        let d = ScanDiagnostic::InconsistentDecomposition { source: "jes".into(), radicand: -1e-4 };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["kind"], "inconsistent_decomposition");
        assert_eq!(v["source"], "jes");
    }
}
