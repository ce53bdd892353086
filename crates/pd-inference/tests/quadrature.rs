//! Quadrature consistency on synthetic models with independent sources.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use pd_core::{Model, Parameter, ParameterSet};
use pd_inference::{GaussianIntervalSolver, NuisanceScanEngine, ScanConfig};
use pd_workspace::{Dataset, GaussianModelConfig};
use proptest::prelude::*;

/// POI `r` correlated with each nuisance, nuisances mutually independent.
fn independent_model(stat: f64, couplings: &[f64]) -> (Model, Dataset, GaussianModelConfig) {
    let names: Vec<String> = (0..couplings.len()).map(|i| format!("theta_{i}")).collect();
    let n = couplings.len() + 1;

    let var_r = stat * stat + couplings.iter().map(|c| c * c).sum::<f64>();
    let mut cov = vec![vec![0.0; n]; n];
    cov[0][0] = var_r;
    for (i, c) in couplings.iter().enumerate() {
        cov[0][i + 1] = *c;
        cov[i + 1][0] = *c;
        cov[i + 1][i + 1] = 1.0;
    }

    let mut parameters = vec!["r".to_string()];
    parameters.extend(names.iter().cloned());
    let config = GaussianModelConfig::new("ModelConfig", parameters.clone(), &cov).unwrap();

    let mut values = BTreeMap::new();
    values.insert("r".to_string(), 1.0);
    for name in &names {
        values.insert(name.clone(), 0.0);
    }
    let data = Dataset::new("data_obs", values).unwrap();

    let one = |name: &str| ParameterSet::new(vec![Parameter::new(name, 0.0)]).unwrap();
    let model = Model {
        observables: one("x"),
        poi: Parameter::new("r", 1.0),
        nuisances: ParameterSet::new(names.iter().map(|n| Parameter::new(n.clone(), 0.0)).collect()).unwrap(),
        global_observables: one("theta_In"),
    };
    (model, data, config)
}

proptest! {
    #[test]
    fn prop_independent_sources_add_in_quadrature(
        stat in 0.01f64..0.5,
        couplings in prop::collection::vec(0.0f64..0.3, 1..6),
    ) {
        let (model, data, mc) = independent_model(stat, &couplings);
        let solver = GaussianIntervalSolver::new();
        let config = ScanConfig::default().with_curves(false);
        let engine = NuisanceScanEngine::new(&solver, &config).unwrap();
        let fr = engine.scan_model("synthetic", &model, &data, &mc).unwrap().result;

        prop_assert!(fr.per_source_uncertainty.values().all(|u| *u >= 0.0));
        prop_assert!(fr.statistical_relative_uncertainty <= fr.total_relative_uncertainty + 1e-12);
        assert_relative_eq!(fr.statistical_relative_uncertainty, stat, max_relative = 1e-9);
        assert_relative_eq!(fr.quadrature_total(), fr.total_relative_uncertainty, max_relative = 1e-9);
        for (i, c) in couplings.iter().enumerate() {
            let u = fr.per_source_uncertainty[&format!("theta_{i}")];
            prop_assert!((u - c).abs() < 1e-9, "source {i}: {u} vs {c}");
        }
    }
}
