//! Run configuration: optional YAML/JSON file merged with command-line flags.

use anyhow::Result;
use pd_core::ResourceNames;
use pd_inference::ScanConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default centre-of-mass energy (TeV).
pub const DEFAULT_ECM: f64 = 8.0;

/// Default integrated luminosity (pb^-1).
pub const DEFAULT_LUMI: f64 = 19600.0;

/// `plrdecomp breakdown` flags. Unset values fall back to the run config, then defaults.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BreakdownArgs {
    /// Comma-separated channel sources (workspace JSON files)
    #[arg(long = "in", value_name = "A,B,C")]
    pub inputs: Option<String>,

    /// Workspace name inside each source [default: w]
    #[arg(long)]
    pub ws: Option<String>,

    /// Observed dataset name [default: data_obs]
    #[arg(long)]
    pub data: Option<String>,

    /// Model config name [default: ModelConfig]
    #[arg(long)]
    pub mc: Option<String>,

    /// Confidence level of the interval [default: 0.68]
    #[arg(long)]
    pub cl: Option<f64>,

    /// Centre-of-mass energy in TeV; 0 marks simulation [default: 8]
    #[arg(long)]
    pub ecm: Option<f64>,

    /// Integrated luminosity in pb^-1 [default: 19600]
    #[arg(long)]
    pub lumi: Option<f64>,

    /// Skip likelihood-curve extraction and curve artifacts
    #[arg(long)]
    pub noplot: bool,

    /// Output directory for JSON artifacts [default: .]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Write the LaTeX table here instead of stdout
    #[arg(long)]
    pub table: Option<PathBuf>,

    /// Run config file (YAML, or JSON by extension)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Zero artifact timestamps for reproducible output
    #[arg(long)]
    pub deterministic: bool,
}

/// Run config file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Channel sources, in processing order.
    pub inputs: Vec<String>,
    /// Workspace object and group names.
    pub names: ResourceNames,
    pub confidence_level: Option<f64>,
    pub ecm: Option<f64>,
    pub lumi: Option<f64>,
    pub noplot: bool,
    pub out_dir: Option<PathBuf>,
    pub table: Option<PathBuf>,
    pub deterministic: bool,
}

pub fn read_run_config(path: &Path) -> Result<RunConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: RunConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        // Default: YAML (serde_yaml_ng).
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

/// Fully resolved settings of one breakdown run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub sources: Vec<String>,
    pub scan: ScanConfig,
    pub ecm: f64,
    pub lumi: f64,
    pub out_dir: PathBuf,
    pub table: Option<PathBuf>,
    pub deterministic: bool,
}

fn split_sources(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

impl RunSettings {
    /// Merge flags over the run config (if any) over defaults.
    pub fn resolve(args: &BreakdownArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                tracing::info!(path = %path.display(), "reading run config");
                read_run_config(path)?
            }
            None => RunConfig::default(),
        };
        Self::merge(args, file)
    }

    fn merge(args: &BreakdownArgs, file: RunConfig) -> Result<Self> {
        let sources = match &args.inputs {
            Some(list) => split_sources(list),
            None => file.inputs,
        };
        if sources.is_empty() {
            anyhow::bail!("no input sources: pass --in a,b,c or set `inputs` in the run config");
        }

        let mut names = file.names;
        if let Some(ws) = &args.ws {
            names.workspace = ws.clone();
        }
        if let Some(data) = &args.data {
            names.dataset = data.clone();
        }
        if let Some(mc) = &args.mc {
            names.model_config = mc.clone();
        }

        let mut scan = ScanConfig { names, ..ScanConfig::default() };
        if let Some(cl) = args.cl.or(file.confidence_level) {
            scan.confidence_level = cl;
        }
        scan.extract_curves = !(args.noplot || file.noplot);
        scan.validate()?;

        Ok(Self {
            sources,
            scan,
            ecm: args.ecm.or(file.ecm).unwrap_or(DEFAULT_ECM),
            lumi: args.lumi.or(file.lumi).unwrap_or(DEFAULT_LUMI),
            out_dir: args.out_dir.clone().or(file.out_dir).unwrap_or_else(|| PathBuf::from(".")),
            table: args.table.clone().or(file.table),
            deterministic: args.deterministic || file.deterministic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let file: RunConfig = serde_yaml_ng::from_str(
            "inputs: [a_ee.json, b_mumu.json]\nconfidence_level: 0.95\nnames:\n  nuisances: systematics\necm: 13\n",
        )
        .unwrap();
        let args = BreakdownArgs { inputs: Some("c.json, d.json,".into()), cl: Some(0.9), ..Default::default() };

        let s = RunSettings::merge(&args, file).unwrap();
        assert_eq!(s.sources, vec!["c.json", "d.json"]);
        assert_eq!(s.scan.confidence_level, 0.9);
        assert_eq!(s.scan.names.nuisances, "systematics");
        assert_eq!(s.scan.names.workspace, "w");
        assert_eq!(s.ecm, 13.0);
        assert_eq!(s.lumi, DEFAULT_LUMI);
        assert!(s.scan.extract_curves);
    }

    #[test]
    fn missing_inputs_is_an_error() {
        let err = RunSettings::merge(&BreakdownArgs::default(), RunConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no input sources"));
    }

    #[test]
    fn invalid_confidence_level_is_rejected() {
        let args = BreakdownArgs { inputs: Some("a.json".into()), cl: Some(1.5), ..Default::default() };
        assert!(RunSettings::merge(&args, RunConfig::default()).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_yaml_ng::from_str::<RunConfig>("input: [a.json]\n").is_err());
    }
}
