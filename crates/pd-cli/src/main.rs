//! PLRDecomp CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::Path;

mod config;

use config::{BreakdownArgs, RunSettings};
use pd_inference::{BreakdownReport, GaussianIntervalSolver, run_breakdown};
use pd_viz::pulls::pulls_artifact;
use pd_viz::{ArtifactMeta, BreakdownSummaryArtifact, LikelihoodCurveArtifact, caption};
use pd_workspace::JsonModelProvider;

#[derive(Parser)]
#[command(name = "plrdecomp")]
#[command(about = "PLRDecomp - profile-likelihood uncertainty breakdown")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose the POI uncertainty into statistical and per-source parts, per channel
    Breakdown(BreakdownArgs),

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Breakdown(args) => cmd_breakdown(&args),
        Commands::Version => {
            println!("plrdecomp {}", pd_core::VERSION);
            Ok(())
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    tracing::info!(path = %path.display(), "wrote artifact");
    Ok(())
}

fn cmd_breakdown(args: &BreakdownArgs) -> Result<()> {
    let settings = RunSettings::resolve(args)?;
    tracing::info!(
        inputs = settings.sources.len(),
        cl = settings.scan.confidence_level,
        out_dir = %settings.out_dir.display(),
        "starting breakdown"
    );

    let provider = JsonModelProvider::new();
    let solver = GaussianIntervalSolver::new();
    let report = run_breakdown(&provider, &solver, &settings.sources, &settings.scan)?;
    for s in &report.skipped {
        tracing::warn!(source = %s.source, reason = %s.reason, "channel skipped");
    }

    std::fs::create_dir_all(&settings.out_dir)?;
    let caption = caption(settings.ecm, settings.lumi);
    write_channel_artifacts(&report, &settings, &caption)?;

    let meta = ArtifactMeta::new(settings.deterministic)?;
    let summary = BreakdownSummaryArtifact::build(&report, &caption, meta)?;
    write_json(&settings.out_dir.join("breakdown.json"), &summary)?;

    let latex = summary.table.to_latex();
    match &settings.table {
        Some(path) => {
            std::fs::write(path, &latex)?;
            tracing::info!(path = %path.display(), "wrote LaTeX table");
        }
        None => print!("{latex}"),
    }
    Ok(())
}

/// `PLR<n>.json`, `PLR<n>_nuis.json` per channel and the combined `PLR.json`.
fn write_channel_artifacts(report: &BreakdownReport, settings: &RunSettings, caption: &str) -> Result<()> {
    let plots = settings.scan.extract_curves;
    let cl = report.confidence_level;
    let ordinals: BTreeMap<&str, usize> =
        report.channel_curves.iter().map(|c| (c.tag.as_str(), c.ordinal)).collect();

    for entry in &report.table {
        let Some(&n) = ordinals.get(entry.tag.as_str()) else {
            continue;
        };
        let fit = &entry.result;
        let meta = ArtifactMeta::new(settings.deterministic)?;
        let pulls = pulls_artifact(&entry.tag, fit, meta);
        write_json(&settings.out_dir.join(format!("PLR{n}_nuis.json")), &pulls)?;

        if plots && let Some(curves) = report.channel_curves.iter().find(|c| c.tag == entry.tag) {
            let meta = ArtifactMeta::new(settings.deterministic)?;
            let artifact = LikelihoodCurveArtifact::build(
                &entry.tag,
                caption,
                &curves.curves,
                (fit.interval_lower, fit.interval_upper),
                cl,
                meta,
            )?;
            write_json(&settings.out_dir.join(format!("PLR{n}.json")), &artifact)?;
        }
    }

    if plots {
        let bounds = report
            .table
            .global_bounds()
            .or_else(|| report.table.reference().map(|e| (e.result.interval_lower, e.result.interval_upper)));
        if let Some(bounds) = bounds {
            let meta = ArtifactMeta::new(settings.deterministic)?;
            let combined = report.combined_curves();
            let artifact = LikelihoodCurveArtifact::build("combined", caption, &combined, bounds, cl, meta)?;
            write_json(&settings.out_dir.join("PLR.json"), &artifact)?;
        }
    }
    Ok(())
}
