//! Cross-channel breakdown summary (numbers-first).

use pd_core::Result;
use pd_inference::{BreakdownReport, ChannelEntry, SkippedChannel};
use serde::Serialize;

use crate::meta::ArtifactMeta;
use crate::table::BreakdownTable;

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownSummaryArtifact {
    pub schema_version: String,
    pub meta: ArtifactMeta,
    pub caption: String,
    pub confidence_level: f64,
    pub reference_channel: String,
    /// Baseline bounds of the inclusive/combined/total channel, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_bounds: Option<[f64; 2]>,
    pub channels: Vec<ChannelEntry>,
    pub skipped: Vec<SkippedChannel>,
    pub table: BreakdownTable,
}

/// Plot caption for a centre-of-mass energy in TeV and a luminosity in pb^-1.
///
/// `ecm == 0` marks simulation.
pub fn caption(ecm: f64, lumi: f64) -> String {
    if ecm == 0.0 {
        "Simulation".to_string()
    } else {
        format!("Preliminary, sqrt(s) = {:.1} TeV, L = {:.1} fb^-1", ecm, lumi / 1000.0)
    }
}

impl BreakdownSummaryArtifact {
    /// Summarise a finished breakdown run.
    pub fn build(report: &BreakdownReport, caption: &str, meta: ArtifactMeta) -> Result<Self> {
        let table = BreakdownTable::build(&report.table, report.confidence_level)?;
        Ok(Self {
            schema_version: "plrdecomp_breakdown_v0".to_string(),
            meta,
            caption: caption.to_string(),
            confidence_level: report.confidence_level,
            reference_channel: table.reference.clone(),
            global_bounds: report.table.global_bounds().map(|(lo, hi)| [lo, hi]),
            channels: report.table.entries().to_vec(),
            skipped: report.skipped.clone(),
            table,
        })
    }
}
