use std::path::PathBuf;

use pd_inference::{GaussianIntervalSolver, ScanConfig, run_breakdown};
use pd_viz::pulls::pulls_artifact;
use pd_viz::{ArtifactMeta, BreakdownSummaryArtifact, LikelihoodCurveArtifact, caption};
use pd_workspace::JsonModelProvider;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures").join(name).display().to_string()
}

fn report() -> pd_inference::BreakdownReport {
    let sources: Vec<String> =
        ["datacard_ee.json", "datacard_emu_nonuisances.json", "datacard_mumu_eq0jets.json", "datacard_combined.json"]
            .into_iter()
            .map(fixture)
            .collect();
    run_breakdown(&JsonModelProvider::new(), &GaussianIntervalSolver::new(), &sources, &ScanConfig::default())
        .expect("breakdown")
}

#[test]
fn test_summary_artifact_json() {
    let report = report();
    let meta = ArtifactMeta::new(true).unwrap();
    let summary = BreakdownSummaryArtifact::build(&report, &caption(8.0, 19600.0), meta).unwrap();
    let v = serde_json::to_value(&summary).unwrap();

    assert_eq!(v["schema_version"], "plrdecomp_breakdown_v0");
    assert_eq!(v["meta"]["tool"], "plrdecomp");
    assert_eq!(v["meta"]["created_unix_ms"], 0);
    assert_eq!(v["reference_channel"], "combined");
    assert_eq!(v["table"]["columns"], serde_json::json!(["combined", "ee", "mumu (=0 jets)"]));
    assert_eq!(v["channels"].as_array().unwrap().len(), 3);
    assert_eq!(v["skipped"].as_array().unwrap().len(), 1);
    assert!(v["global_bounds"].is_array());

    // Source rows come from the combined channel: jes, pu. ee has no pu.
    let sources = &summary.table.sources;
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].label, "jes");
    assert_eq!(sources[1].cells[1], None);

    let latex = summary.table.to_latex();
    assert!(latex.contains(r"Category & combined & ee & mumu (=0 jets) \\\hline"), "{latex}");
    assert!(latex.contains(r"Total unc. (\%) & 20.0 & 33.3 & 33.3"), "{latex}");
}

#[test]
fn test_combined_curves_artifact() {
    let report = report();
    let curves = report.combined_curves();
    let bounds = report.table.global_bounds().unwrap();
    let meta = ArtifactMeta::new(true).unwrap();
    let artifact =
        LikelihoodCurveArtifact::build("combined", &caption(0.0, 0.0), &curves, bounds, report.confidence_level, meta)
            .unwrap();

    assert_eq!(artifact.caption, "Simulation");
    assert_eq!(artifact.curves.len(), 3);
    assert_eq!(artifact.curves[0].label, "combined");
    assert_eq!(artifact.curves[0].x.len(), 200);
    assert_eq!(artifact.x_range, [0.0, 3.0]);
}

#[test]
fn test_pulls_artifact() {
    let report = report();
    let fit = report.table.get("ee").unwrap();
    let pulls = pulls_artifact("ee", fit, ArtifactMeta::new(true).unwrap());
    let names: Vec<&str> = pulls.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["jet_energy_scale", "lumi"]);
    assert_eq!(pulls.y_range, [-2.5, 2.5]);
    assert_eq!(pulls.entries[1].postfit_value, 0.4);
}
