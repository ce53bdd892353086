use pd_core::FitResult;
use serde::Serialize;

use crate::meta::ArtifactMeta;

/// Fixed y-range of the pull display.
pub const Y_RANGE: [f64; 2] = [-2.5, 2.5];

#[derive(Debug, Clone, Serialize)]
pub struct PullsArtifact {
    pub schema_version: String,
    pub meta: ArtifactMeta,
    pub channel: String,
    pub ordering_policy: String,
    pub y_range: [f64; 2],
    pub entries: Vec<PullEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullEntry {
    pub name: String,
    pub postfit_value: f64,
}

/// Post-fit nuisance values of one channel, by display name.
///
/// Non-finite values are dropped; ordering is lexicographic by name.
pub fn pulls_artifact(channel: &str, fit: &FitResult, meta: ArtifactMeta) -> PullsArtifact {
    let entries = fit
        .post_fit_nuisance_values
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(name, v)| PullEntry { name: name.clone(), postfit_value: *v })
        .collect();

    PullsArtifact {
        schema_version: "plrdecomp_pulls_v0".to_string(),
        meta,
        channel: channel.to_string(),
        ordering_policy: "name_lex".to_string(),
        y_range: Y_RANGE,
        entries,
    }
}
