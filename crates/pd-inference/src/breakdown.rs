//! Multi-channel driver: scan every source in order and aggregate the results.

use pd_core::{Error, IntervalSolver, ModelProvider, NamedCurve, Result, Workspace};
use serde::Serialize;

use crate::channel::{ChannelTable, channel_tag};
use crate::config::ScanConfig;
use crate::scan::NuisanceScanEngine;

/// Likelihood curves of one scanned channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelCurves {
    /// Channel tag.
    pub tag: String,
    /// 1-based position of the source in the input list.
    pub ordinal: usize,
    /// Curves labelled `total` / `stat`.
    pub curves: Vec<NamedCurve>,
}

/// A source that produced no table entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedChannel {
    /// Source identifier as given.
    pub source: String,
    /// Rendered error.
    pub reason: String,
}

/// Everything a report needs after all channels were processed.
#[derive(Debug, Clone)]
pub struct BreakdownReport {
    /// Finalized per-channel results.
    pub table: ChannelTable,
    /// Curves of the scanned channels, in input order.
    pub channel_curves: Vec<ChannelCurves>,
    /// Sources skipped with the reason.
    pub skipped: Vec<SkippedChannel>,
    /// Confidence level used by every scan.
    pub confidence_level: f64,
}

impl BreakdownReport {
    /// Baseline curve of every channel, labelled by tag, in table order.
    pub fn combined_curves(&self) -> Vec<NamedCurve> {
        self.table
            .iter()
            .filter_map(|entry| {
                let channel = self.channel_curves.iter().find(|c| c.tag == entry.tag)?;
                let total = channel.curves.iter().find(|c| c.label == "total")?;
                Some(NamedCurve { label: entry.tag.clone(), points: total.points.clone() })
            })
            .collect()
    }
}

/// Scan every source in order and collect the results into a [`BreakdownReport`].
///
/// A failing source (missing file, workspace or object, incomplete model, solver
/// error, duplicate tag) is logged and skipped. Only an empty table is fatal.
pub fn run_breakdown<P, S>(
    provider: &P,
    solver: &S,
    sources: &[String],
    config: &ScanConfig,
) -> Result<BreakdownReport>
where
    P: ModelProvider,
    P::Workspace: Workspace<Data = S::Data, Config = S::Config>,
    S: IntervalSolver,
{
    let engine = NuisanceScanEngine::new(solver, config)?;
    let mut table = ChannelTable::new();
    let mut channel_curves = Vec::new();
    let mut skipped = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        let tag = channel_tag(source);
        log::info!("channel {}/{}: '{tag}' from {source}", i + 1, sources.len());

        let outcome = if table.contains(&tag) {
            Err(Error::Validation(format!("channel '{tag}' is already in the table")))
        } else {
            provider.open(source, &config.names.workspace).and_then(|ws| engine.scan(&tag, &ws))
        };

        match outcome {
            Ok(scan) => {
                channel_curves.push(ChannelCurves { tag: tag.clone(), ordinal: i + 1, curves: scan.curves() });
                table.insert(tag, scan.result)?;
            }
            Err(e) => {
                log::warn!("skipping '{tag}' ({source}): {e}");
                skipped.push(SkippedChannel { source: source.clone(), reason: e.to_string() });
            }
        }
    }

    if table.is_empty() {
        return Err(Error::Validation(format!(
            "no channel could be scanned ({} inputs, {} skipped)",
            sources.len(),
            skipped.len()
        )));
    }
    log::info!("scanned {} channels, skipped {}", table.len(), skipped.len());

    Ok(BreakdownReport { table, channel_curves, skipped, confidence_level: config.confidence_level })
}
