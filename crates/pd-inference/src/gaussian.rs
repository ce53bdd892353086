//! Gaussian profile-likelihood interval solver.
//!
//! The model config describes the joint covariance Σ of the parameter estimates and
//! the dataset their observed central values m. Holding a subset F of parameters at
//! x_F, the remaining estimates U follow the conditional Gaussian
//!
//! ```text
//! m_U|F = m_U + Σ_UF Σ_FF⁻¹ (x_F − m_F)
//! Σ_U|F = Σ_UU − Σ_UF Σ_FF⁻¹ Σ_FU
//! ```
//!
//! and the profile `-log λ(μ)` of the POI is the parabola `½ ((μ − μ̂)/σ)²`, so the
//! interval at confidence level `cl` is `μ̂ ± z σ` with `z = Φ⁻¹((1 + cl)/2)`.

use nalgebra::{DMatrix, DVector};
use pd_core::{
    CurveGrid, CurveKind, CurvePoint, Error, IntervalEstimate, IntervalSolver, Result, SampledCurve,
    SolveRequest,
};
use pd_workspace::{Dataset, GaussianModelConfig};
use statrs::distribution::{ContinuousCDF, Normal};

/// Interval half-width in units of σ for a two-sided interval at `cl`.
pub fn interval_sigmas(cl: f64) -> Result<f64> {
    if !(cl > 0.0 && cl < 1.0) {
        return Err(Error::Validation(format!("confidence level must lie in (0, 1), got {cl}")));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Computation(format!("normal distribution: {e}")))?;
    Ok(normal.inverse_cdf(0.5 + 0.5 * cl))
}

/// `-log λ` threshold that defines the interval at `cl` (0.5 at 68.27%).
pub fn nll_threshold(cl: f64) -> Result<f64> {
    let z = interval_sigmas(cl)?;
    Ok(0.5 * z * z)
}

fn block(config: &GaussianModelConfig, rows: &[usize], cols: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), cols.len(), |r, c| config.covariance(rows[r], cols[c]))
}

fn config_index(config: &GaussianModelConfig, name: &str) -> Result<usize> {
    config.index_of(name).ok_or_else(|| {
        Error::Validation(format!("parameter '{name}' is not described by model config '{}'", config.name))
    })
}

/// Conditional estimates for every parameter of the model config.
struct ConditionalFit {
    values: Vec<f64>,
    errors: Vec<f64>,
}

impl ConditionalFit {
    fn compute(
        data: &Dataset,
        config: &GaussianModelConfig,
        fixed: &[Option<f64>],
    ) -> Result<Self> {
        let n = config.dim();
        let mut m = Vec::with_capacity(n);
        for p in config.parameters() {
            let v = data.value(p).ok_or_else(|| {
                Error::Validation(format!("dataset '{}' has no value for '{p}'", data.name))
            })?;
            m.push(v);
        }

        let free: Vec<usize> = (0..n).filter(|&i| fixed[i].is_none()).collect();
        let held: Vec<usize> = (0..n).filter(|&i| fixed[i].is_some()).collect();

        let s_uu = block(config, &free, &free);
        let m_u = DVector::from_iterator(free.len(), free.iter().map(|&i| m[i]));

        let (mean_u, cov_u) = if held.is_empty() {
            (m_u, s_uu)
        } else {
            let s_uf = block(config, &free, &held);
            let s_ff_inv = block(config, &held, &held).try_inverse().ok_or_else(|| {
                Error::Computation(format!(
                    "model config '{}': covariance block of the fixed parameters is singular",
                    config.name
                ))
            })?;
            let delta = DVector::from_iterator(
                held.len(),
                held.iter().map(|&i| fixed[i].unwrap_or(m[i]) - m[i]),
            );
            let gain = &s_uf * s_ff_inv;
            let mean = m_u + &gain * delta;
            let cov = s_uu - &gain * s_uf.transpose();
            (mean, cov)
        };

        let mut values = vec![0.0; n];
        let mut errors = vec![0.0; n];
        for (k, &i) in free.iter().enumerate() {
            values[i] = mean_u[k];
            errors[i] = cov_u[(k, k)].max(0.0).sqrt();
        }
        for &i in &held {
            values[i] = fixed[i].unwrap_or(m[i]);
        }
        Ok(Self { values, errors })
    }
}

/// Interval solver for Gaussian-approximated likelihoods.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianIntervalSolver;

impl GaussianIntervalSolver {
    /// Create a solver.
    pub fn new() -> Self {
        Self
    }
}

impl IntervalSolver for GaussianIntervalSolver {
    type Data = Dataset;
    type Config = GaussianModelConfig;

    fn solve(&self, request: &SolveRequest<'_, Dataset, GaussianModelConfig>) -> Result<IntervalEstimate> {
        let config = request.config;
        let model = request.model;
        let poi = request.poi();

        let poi_idx = config_index(config, &poi.name)?;

        // Parameters of the config that are neither the POI nor a nuisance are profiled.
        let mut fixed: Vec<Option<f64>> = vec![None; config.dim()];
        if poi.constant {
            fixed[poi_idx] = Some(poi.value);
        }
        for p in &model.nuisances {
            let i = config_index(config, &p.name)?;
            if p.constant {
                fixed[i] = Some(p.value);
            }
        }

        let fit = ConditionalFit::compute(request.data, config, &fixed)?;

        let point_estimate = poi.clamp(fit.values[poi_idx]);
        let sigma = fit.errors[poi_idx];
        let half_width = interval_sigmas(request.confidence_level)? * sigma;

        let mut post_fit_nuisances = model.nuisances.clone();
        for p in post_fit_nuisances.iter_mut() {
            if p.constant {
                continue;
            }
            let i = config_index(config, &p.name)?;
            p.value = p.clamp(fit.values[i]);
            p.error = fit.errors[i];
        }

        Ok(IntervalEstimate {
            point_estimate,
            lower_limit: poi.clamp(point_estimate - half_width),
            upper_limit: poi.clamp(point_estimate + half_width),
            parameter_error: sigma,
            post_fit_nuisances,
        })
    }

    fn sample_curves(
        &self,
        request: &SolveRequest<'_, Dataset, GaussianModelConfig>,
        estimate: &IntervalEstimate,
        grid: &CurveGrid,
    ) -> Result<Vec<SampledCurve>> {
        let sigma = estimate.parameter_error;
        if !(sigma.is_finite() && sigma > 0.0) {
            return Ok(Vec::new());
        }
        let mu_hat = estimate.point_estimate;
        let threshold = nll_threshold(request.confidence_level)?;
        let poi = &request.poi().name;

        let nll = grid
            .xs()
            .into_iter()
            .map(|x| {
                let d = (x - mu_hat) / sigma;
                CurvePoint { x, y: 0.5 * d * d }
            })
            .collect();

        let marker = |x: f64| vec![CurvePoint { x, y: 0.0 }, CurvePoint { x, y: threshold }];

        Ok(vec![
            SampledCurve {
                kind: CurveKind::Threshold,
                name: "threshold".to_string(),
                points: vec![
                    CurvePoint { x: grid.x_min, y: threshold },
                    CurvePoint { x: grid.x_max, y: threshold },
                ],
            },
            SampledCurve { kind: CurveKind::ProfileNll, name: format!("nll_{poi}"), points: nll },
            SampledCurve {
                kind: CurveKind::IntervalMarker,
                name: "lower_limit".to_string(),
                points: marker(estimate.lower_limit),
            },
            SampledCurve {
                kind: CurveKind::IntervalMarker,
                name: "upper_limit".to_string(),
                points: marker(estimate.upper_limit),
            },
        ])
    }

    fn name(&self) -> &str {
        "gaussian"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pd_core::{Model, Parameter, ParameterSet};
    use std::collections::BTreeMap;

    fn set(params: Vec<Parameter>) -> ParameterSet {
        ParameterSet::new(params).unwrap()
    }

    /// POI `r` with two independent sources: var(r) = 0.0225 + 0.0099 + 0.0076.
    fn fixture() -> (Dataset, GaussianModelConfig, Model) {
        let values: BTreeMap<String, f64> =
            [("r", 1.0), ("jes", 0.3), ("pu", -0.2)].into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let data = Dataset::new("data_obs", values).unwrap();
        let a = 0.0099_f64.sqrt();
        let b = 0.0076_f64.sqrt();
        let config = GaussianModelConfig::new(
            "ModelConfig",
            vec!["r".into(), "jes".into(), "pu".into()],
            &[vec![0.04, -a, -b], vec![-a, 1.0, 0.0], vec![-b, 0.0, 1.0]],
        )
        .unwrap();
        let model = Model {
            observables: set(vec![Parameter::new("x", 0.0)]),
            poi: Parameter::new("r", 1.0).with_bounds(0.0, 10.0),
            nuisances: set(vec![Parameter::new("jes", 0.0), Parameter::new("pu", 0.0)]),
            global_observables: set(vec![Parameter::new("jes_In", 0.0).with_constant(true)]),
        };
        (data, config, model)
    }

    fn solve(data: &Dataset, config: &GaussianModelConfig, model: &Model) -> Result<IntervalEstimate> {
        let req = SolveRequest { data, config, model, confidence_level: 0.68 };
        GaussianIntervalSolver.solve(&req)
    }

    #[test]
    fn test_threshold_at_one_sigma() {
        assert_abs_diff_eq!(nll_threshold(0.682_689_492_137_086).unwrap(), 0.5, epsilon = 1e-9);
        assert!(nll_threshold(1.0).is_err());
    }

    #[test]
    fn test_unconstrained_fit() {
        let (data, config, model) = fixture();
        let est = solve(&data, &config, &model).unwrap();
        assert_abs_diff_eq!(est.point_estimate, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(est.parameter_error, 0.2, epsilon = 1e-12);

        let z = interval_sigmas(0.68).unwrap();
        assert_abs_diff_eq!(est.lower_limit, 1.0 - z * 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(est.upper_limit, 1.0 + z * 0.2, epsilon = 1e-12);

        let jes = est.post_fit_nuisances.get("jes").unwrap();
        assert_abs_diff_eq!(jes.value, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(jes.error, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fixing_nuisances_leaves_stat_error() {
        let (data, config, mut model) = fixture();
        for p in model.nuisances.iter_mut() {
            p.value = data.value(&p.name).unwrap();
            p.constant = true;
        }
        let est = solve(&data, &config, &model).unwrap();
        assert_abs_diff_eq!(est.parameter_error, 0.15, epsilon = 1e-12);
        assert_abs_diff_eq!(est.point_estimate, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_floating_source() {
        let (data, config, mut model) = fixture();
        let p = model.nuisances.get_mut("pu").unwrap();
        p.value = -0.2;
        p.constant = true;
        let est = solve(&data, &config, &model).unwrap();
        assert_abs_diff_eq!(est.parameter_error, 0.18, epsilon = 1e-12);
    }

    #[test]
    fn test_pinning_away_from_data_shifts_estimate() {
        let (data, config, mut model) = fixture();
        let p = model.nuisances.get_mut("jes").unwrap();
        p.value = 1.3;
        p.constant = true;
        let est = solve(&data, &config, &model).unwrap();
        // m_r + cov(r, jes) / var(jes) * (1.3 - 0.3)
        assert_abs_diff_eq!(est.point_estimate, 1.0 - 0.0099_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(est.post_fit_nuisances.get("jes").unwrap().value, 1.3);
    }

    #[test]
    fn test_constant_poi_gives_zero_width_interval() {
        let (data, config, mut model) = fixture();
        model.poi.constant = true;
        model.poi.value = 1.5;
        let est = solve(&data, &config, &model).unwrap();
        assert_eq!(est.point_estimate, 1.5);
        assert_eq!(est.lower_limit, est.upper_limit);
        assert_eq!(est.parameter_error, 0.0);
    }

    #[test]
    fn test_interval_clamped_to_poi_bounds() {
        let (data, config, mut model) = fixture();
        model.poi = model.poi.clone().with_bounds(0.9, 10.0);
        let est = solve(&data, &config, &model).unwrap();
        assert_eq!(est.lower_limit, 0.9);
    }

    #[test]
    fn test_unknown_nuisance_is_rejected() {
        let (data, config, mut model) = fixture();
        model.nuisances = set(vec![Parameter::new("jes", 0.0), Parameter::new("lumi", 0.0)]);
        let err = solve(&data, &config, &model).unwrap_err();
        assert!(err.to_string().contains("'lumi' is not described"), "{err}");
    }

    #[test]
    fn test_singular_fixed_block() {
        let values: BTreeMap<String, f64> =
            [("r", 1.0), ("a", 0.0)].into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let data = Dataset::new("d", values).unwrap();
        let config = GaussianModelConfig::new(
            "mc",
            vec!["r".into(), "a".into()],
            &[vec![0.04, 0.0], vec![0.0, 0.0]],
        )
        .unwrap();
        let (_, _, mut model) = fixture();
        model.nuisances = set(vec![Parameter::new("a", 0.0).with_constant(true)]);
        let err = solve(&data, &config, &model).unwrap_err();
        assert!(err.to_string().contains("singular"), "{err}");
    }

    #[test]
    fn test_curves_are_tagged() {
        let (data, config, model) = fixture();
        let req = SolveRequest { data: &data, config: &config, model: &model, confidence_level: 0.68 };
        let est = GaussianIntervalSolver.solve(&req).unwrap();
        let grid = CurveGrid::for_upper_limit(est.upper_limit);
        let curves = GaussianIntervalSolver.sample_curves(&req, &est, &grid).unwrap();

        let nll: Vec<_> = curves.iter().filter(|c| c.kind == CurveKind::ProfileNll).collect();
        assert_eq!(nll.len(), 1);
        assert_eq!(nll[0].name, "nll_r");
        assert_eq!(nll[0].points.len(), CurveGrid::DEFAULT_POINTS);

        let min = nll[0].points.iter().min_by(|a, b| a.y.total_cmp(&b.y)).unwrap();
        assert!((min.x - 1.0).abs() < 0.02, "minimum at {}", min.x);
        assert!(curves.iter().any(|c| c.kind == CurveKind::Threshold));
    }
}
