use pd_core::{CurveGrid, NamedCurve, Result};
use pd_inference::gaussian::nll_threshold;
use serde::Serialize;

use crate::meta::ArtifactMeta;

/// Fixed y-range of the `-log λ` plots.
pub const Y_RANGE: [f64; 2] = [0.0, 5.0];

/// One curve, columnar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledCurve {
    /// `total` / `stat` or a channel tag.
    pub label: String,
    /// POI values.
    pub x: Vec<f64>,
    /// `-log λ` values aligned with `x`.
    pub y: Vec<f64>,
}

impl From<&NamedCurve> for LabelledCurve {
    fn from(curve: &NamedCurve) -> Self {
        Self {
            label: curve.label.clone(),
            x: curve.points.iter().map(|p| p.x).collect(),
            y: curve.points.iter().map(|p| p.y).collect(),
        }
    }
}

/// Plot-friendly likelihood curves with interval markers and threshold line.
#[derive(Debug, Clone, Serialize)]
pub struct LikelihoodCurveArtifact {
    pub schema_version: String,
    pub meta: ArtifactMeta,
    /// Channel tag, or `combined` for the cross-channel plot.
    pub header: String,
    pub caption: String,
    pub confidence_level: f64,
    /// `-log λ` level that defines the interval.
    pub threshold: f64,
    /// Interval bounds drawn as vertical markers.
    pub interval: [f64; 2],
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    /// `total` / `inclusive` curves first, otherwise in input order.
    pub curves: Vec<LabelledCurve>,
}

fn is_primary(label: &str) -> bool {
    label == "total" || label.contains("inclusive")
}

impl LikelihoodCurveArtifact {
    /// Build from extracted curves and the interval to mark.
    pub fn build(
        header: &str,
        caption: &str,
        curves: &[NamedCurve],
        interval: (f64, f64),
        confidence_level: f64,
        meta: ArtifactMeta,
    ) -> Result<Self> {
        let mut out: Vec<LabelledCurve> = curves.iter().map(LabelledCurve::from).collect();
        out.sort_by_key(|c| !is_primary(&c.label));

        let grid = CurveGrid::for_upper_limit(interval.1);
        Ok(Self {
            schema_version: "plrdecomp_likelihood_v0".to_string(),
            meta,
            header: header.to_string(),
            caption: caption.to_string(),
            confidence_level,
            threshold: nll_threshold(confidence_level)?,
            interval: [interval.0, interval.1],
            x_range: [grid.x_min, grid.x_max],
            y_range: Y_RANGE,
            curves: out,
        })
    }
}
