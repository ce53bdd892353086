//! Cross-channel uncertainty breakdown table.

use pd_core::{Error, FitResult, Result};
use pd_inference::ChannelTable;
use serde::Serialize;

/// One table row: a label and one cell per channel (`None` renders blank).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Row label (LaTeX-ready).
    pub label: String,
    /// Rendered cells in column order.
    pub cells: Vec<Option<String>>,
}

/// Breakdown table: fixed metric rows, then one row per systematic source of the
/// reference channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownTable {
    /// Channel tags in table order.
    pub columns: Vec<String>,
    /// Channel whose sources label the source rows.
    pub reference: String,
    /// Point estimate, interval, statistical and total uncertainty.
    pub metrics: Vec<TableRow>,
    /// Per-source relative uncertainties in percent.
    pub sources: Vec<TableRow>,
}

/// Display name of a systematic source.
pub fn humanize_source(name: &str) -> String {
    name.replace('_', " ")
}

/// Render `x` with `digits` significant digits.
fn significant(x: f64, digits: i32) -> String {
    if x == 0.0 || !x.is_finite() {
        return format!("{x}");
    }
    let magnitude = x.abs().log10().floor() as i32;
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    format!("{x:.decimals$}")
}

/// Confidence level as a percentage label, e.g. `68` for 0.68.
fn percent_label(confidence_level: f64) -> String {
    let pct = (confidence_level * 100.0 * 1e6).round() / 1e6;
    format!("{pct}")
}

fn row(table: &ChannelTable, label: String, cell: impl Fn(&FitResult) -> Option<String>) -> TableRow {
    TableRow { label, cells: table.iter().map(|e| cell(&e.result)).collect() }
}

impl BreakdownTable {
    /// Build from the channel table; an empty table is a `Validation` error.
    pub fn build(table: &ChannelTable, confidence_level: f64) -> Result<Self> {
        let reference = table
            .reference()
            .ok_or_else(|| Error::Validation("breakdown table needs at least one channel".to_string()))?;

        let columns: Vec<String> = table.iter().map(|e| e.tag.clone()).collect();
        let metrics = vec![
            row(table, r"$\sigma/\sigma_{SM}$".to_string(), |r| Some(format!("{:.3}", r.point_estimate))),
            row(table, format!(r"{} \% C.I.", percent_label(confidence_level)), |r| {
                Some(format!("]{:.3},{:.3}[", r.interval_lower, r.interval_upper))
            }),
            row(table, r"Stat. unc. (\%)".to_string(), |r| {
                Some(format!("{:.1}", 100.0 * r.statistical_relative_uncertainty))
            }),
            row(table, r"Total unc. (\%)".to_string(), |r| {
                Some(format!("{:.1}", 100.0 * r.total_relative_uncertainty))
            }),
        ];

        let sources = reference
            .result
            .per_source_uncertainty
            .keys()
            .map(|source| {
                row(table, humanize_source(source), |r| {
                    r.per_source_uncertainty.get(source).map(|u| significant(100.0 * u, 2))
                })
            })
            .collect();

        Ok(Self { columns, reference: reference.tag.clone(), metrics, sources })
    }

    /// LaTeX `tabular` rendering.
    pub fn to_latex(&self) -> String {
        let line = |label: &str, cells: &[Option<String>]| {
            let mut out = label.to_string();
            for c in cells {
                out.push_str(" & ");
                out.push_str(c.as_deref().unwrap_or(""));
            }
            out
        };

        let mut out = String::new();
        out.push_str(&format!("\\begin{{tabular}}{{l|{}}}\n", "c".repeat(self.columns.len())));
        out.push_str(&line("Category", &self.columns.iter().cloned().map(Some).collect::<Vec<_>>()));
        out.push_str(" \\\\\\hline\n");
        for (i, r) in self.metrics.iter().enumerate() {
            out.push_str(&line(&r.label, &r.cells));
            out.push_str(if i + 1 == self.metrics.len() { " \\\\\\hline\n" } else { " \\\\\n" });
        }
        for r in &self.sources {
            out.push_str(&line(&r.label, &r.cells));
            out.push_str(" \\\\\n");
        }
        out.push_str("\\hline\n\\end{tabular}\n");
        out
    }
}
