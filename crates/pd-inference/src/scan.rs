//! Nuisance scan engine.
//!
//! For one channel the engine runs `N + 2` interval fits in a fixed order:
//!
//! 1. `total`: nothing forced fixed beyond the model defaults. Gives the headline
//!    interval and the post-fit nuisance snapshot.
//! 2. `stat`: every nuisance pinned to its snapshot value and held fixed.
//! 3. one step per nuisance: every nuisance pinned, all but that one held fixed.
//!
//! A source's contribution is the quadrature difference between its step and the
//! `stat` step, clamped at zero.

use std::collections::BTreeMap;
use std::fmt;

use pd_core::{
    CurveGrid, CurveKind, CurvePoint, Error, FitResult, IntervalEstimate, IntervalSolver, Model,
    NamedCurve, ParameterSet, ResourceKind, Result, ScanDiagnostic, SolveRequest, Workspace,
};
use serde::Serialize;

use crate::config::ScanConfig;

/// Which parameters a step leaves floating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepLabel {
    /// Baseline: model defaults only.
    Total,
    /// All nuisances fixed.
    Stat,
    /// All nuisances fixed except the named one.
    Source(String),
}

impl fmt::Display for StepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepLabel::Total => f.write_str("total"),
            StepLabel::Stat => f.write_str("stat"),
            StepLabel::Source(name) => f.write_str(name),
        }
    }
}

/// One fit configuration of the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStep {
    /// Step label.
    pub label: StepLabel,
    /// Nuisance name -> pinned value (empty for the baseline).
    pub fixed_nuisance_values: BTreeMap<String, f64>,
    /// Confidence level of the interval.
    pub confidence_level: f64,
}

impl ScanStep {
    /// Baseline step: no pins, nothing forced fixed.
    pub fn baseline(confidence_level: f64) -> Self {
        Self { label: StepLabel::Total, fixed_nuisance_values: BTreeMap::new(), confidence_level }
    }

    /// Step with every nuisance pinned to `pins`.
    pub fn pinned(label: StepLabel, pins: &BTreeMap<String, f64>, confidence_level: f64) -> Self {
        Self { label, fixed_nuisance_values: pins.clone(), confidence_level }
    }

    /// `true` if this step forces `nuisance` constant.
    pub fn holds_fixed(&self, nuisance: &str) -> bool {
        match &self.label {
            StepLabel::Total => false,
            StepLabel::Stat => true,
            StepLabel::Source(floating) => floating != nuisance,
        }
    }

    /// Copy of `model` with this step's pins and constant flags applied.
    ///
    /// Nuisances that are constant by default stay constant.
    pub fn configure(&self, model: &Model) -> Model {
        let mut configured = model.clone();
        for p in configured.nuisances.iter_mut() {
            if let Some(&v) = self.fixed_nuisance_values.get(&p.name) {
                p.value = v;
            }
            if self.holds_fixed(&p.name) {
                p.constant = true;
            }
        }
        configured
    }
}

/// Output of one scan step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanStepResult {
    /// Step label (`total`, `stat` or a nuisance name).
    pub label: String,
    /// POI point estimate.
    pub point_estimate: f64,
    /// Lower interval bound (after the degenerate-interval fallback).
    pub lower_limit: f64,
    /// Upper interval bound (after the degenerate-interval fallback).
    pub upper_limit: f64,
    /// Signed relative error `σ_POI / point_estimate`.
    pub relative_error: f64,
    /// Profile `-log λ` curve, when extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<Vec<CurvePoint>>,
}

/// Post-fit nuisance state captured once after the baseline fit.
#[derive(Debug, Clone, PartialEq)]
pub struct NuisanceSnapshot {
    params: ParameterSet,
}

impl NuisanceSnapshot {
    /// Capture the post-fit nuisances of the baseline estimate.
    pub fn capture(estimate: &IntervalEstimate) -> Self {
        Self { params: estimate.post_fit_nuisances.clone() }
    }

    /// Post-fit value of a nuisance.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.params.get(name).map(|p| p.value)
    }

    /// Pin values for `names`: the snapshot value, or 0 when absent or non-finite.
    pub fn pin_values(&self, names: &[String], channel: &str) -> BTreeMap<String, f64> {
        names
            .iter()
            .map(|name| {
                let v = match self.value(name) {
                    Some(v) if v.is_finite() => v,
                    Some(v) => {
                        log::debug!("[{channel}] post-fit value of '{name}' is {v}, pinning to 0");
                        0.0
                    }
                    None => {
                        log::debug!("[{channel}] '{name}' absent from the post-fit snapshot, pinning to 0");
                        0.0
                    }
                };
                (name.clone(), v)
            })
            .collect()
    }

    /// Finite post-fit values keyed by display title.
    pub fn values_by_title(&self) -> BTreeMap<String, f64> {
        self.params
            .iter()
            .filter(|p| p.value.is_finite())
            .map(|p| (p.title.clone(), p.value))
            .collect()
    }
}

/// Everything the scan produced for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelScan {
    /// Channel tag.
    pub tag: String,
    /// Final decomposition.
    pub result: FitResult,
    /// Step results in execution order.
    pub steps: Vec<ScanStepResult>,
}

impl ChannelScan {
    /// Extracted likelihood curves, labelled by step.
    pub fn curves(&self) -> Vec<NamedCurve> {
        self.steps
            .iter()
            .filter_map(|s| {
                s.curve.as_ref().map(|points| NamedCurve { label: s.label.clone(), points: points.clone() })
            })
            .collect()
    }

    /// Baseline (`total`) curve, if extracted.
    pub fn baseline_curve(&self) -> Option<&[CurvePoint]> {
        self.steps.first().and_then(|s| s.curve.as_deref())
    }
}

/// Inputs shared by every step of one channel.
struct StepContext<'c, D, C> {
    channel: &'c str,
    model: &'c Model,
    data: &'c D,
    model_config: &'c C,
}

/// Drives the `N + 2` fits of one channel through an [`IntervalSolver`].
#[derive(Debug)]
pub struct NuisanceScanEngine<'a, S> {
    solver: &'a S,
    config: &'a ScanConfig,
}

impl<'a, S: IntervalSolver> NuisanceScanEngine<'a, S> {
    /// Create an engine; the configuration is validated up front.
    pub fn new(solver: &'a S, config: &'a ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { solver, config })
    }

    /// Scan the channel held in `workspace`.
    ///
    /// Fails before any fit when a parameter group, the dataset or the model
    /// config cannot be resolved.
    pub fn scan<W>(&self, channel: &str, workspace: &W) -> Result<ChannelScan>
    where
        W: Workspace<Data = S::Data, Config = S::Config> + ?Sized,
    {
        let names = &self.config.names;
        let resolved = Model::from_workspace(workspace, names).and_then(|model| {
            let data = workspace
                .dataset(&names.dataset)
                .ok_or_else(|| Error::missing(ResourceKind::Dataset, &names.dataset, workspace.name()))?;
            let model_config = workspace.model_config(&names.model_config).ok_or_else(|| {
                Error::missing(ResourceKind::ModelConfig, &names.model_config, workspace.name())
            })?;
            Ok((model, data, model_config))
        });
        let (model, data, model_config) = match resolved {
            Ok(r) => r,
            Err(e) => {
                log::error!("[{channel}] {e}; workspace '{}' contains:", workspace.name());
                for line in workspace.contents() {
                    log::error!("[{channel}]   {line}");
                }
                return Err(e);
            }
        };
        self.scan_model(channel, &model, data, model_config)
    }

    /// Scan an already-resolved model.
    pub fn scan_model(
        &self,
        channel: &str,
        model: &Model,
        data: &S::Data,
        model_config: &S::Config,
    ) -> Result<ChannelScan> {
        let cl = self.config.confidence_level;
        let ctx = StepContext { channel, model, data, model_config };
        let nuisance_names = model.nuisances.names();
        log::info!(
            "[{channel}] scanning POI '{}' over {} nuisances ({} solver, CL {cl})",
            model.poi.name,
            nuisance_names.len(),
            self.solver.name()
        );

        let mut steps = Vec::with_capacity(nuisance_names.len() + 2);
        let mut diagnostics = Vec::new();

        let (baseline, estimate) = self.run_step(&ctx, &ScanStep::baseline(cl), None, &mut diagnostics)?;
        let snapshot = NuisanceSnapshot::capture(&estimate);
        let pins = snapshot.pin_values(&nuisance_names, channel);
        let baseline_upper = baseline.upper_limit;
        steps.push(baseline);

        let stat_step = ScanStep::pinned(StepLabel::Stat, &pins, cl);
        let (stat, _) = self.run_step(&ctx, &stat_step, Some(baseline_upper), &mut diagnostics)?;
        let statistical = stat.relative_error;
        steps.push(stat);

        let mut per_source_uncertainty = BTreeMap::new();
        for name in &nuisance_names {
            let step = ScanStep::pinned(StepLabel::Source(name.clone()), &pins, cl);
            let (res, _) = self.run_step(&ctx, &step, Some(baseline_upper), &mut diagnostics)?;
            let radicand = res.relative_error.powi(2) - statistical.powi(2);
            if radicand < 0.0 {
                log::warn!(
                    "[{channel}] '{name}': relative error {} below statistical {}; contribution clamped to 0",
                    res.relative_error,
                    statistical
                );
                diagnostics.push(ScanDiagnostic::InconsistentDecomposition { source: name.clone(), radicand });
            }
            per_source_uncertainty.insert(name.clone(), radicand.max(0.0).sqrt());
            steps.push(res);
        }

        let headline = &steps[0];
        let total = headline.relative_error;
        if statistical.abs() > total.abs() {
            log::warn!("[{channel}] statistical uncertainty {statistical} exceeds total {total}");
            diagnostics.push(ScanDiagnostic::StatExceedsTotal { statistical, total });
        }

        let result = FitResult {
            point_estimate: headline.point_estimate,
            interval_lower: headline.lower_limit,
            interval_upper: headline.upper_limit,
            total_relative_uncertainty: total,
            statistical_relative_uncertainty: statistical,
            per_source_uncertainty,
            post_fit_nuisance_values: snapshot.values_by_title(),
            diagnostics,
        };
        log::info!(
            "[{channel}] r = {:.4} [{:.4}, {:.4}], stat {:.2}%, total {:.2}%",
            result.point_estimate,
            result.interval_lower,
            result.interval_upper,
            100.0 * result.statistical_relative_uncertainty,
            100.0 * result.total_relative_uncertainty
        );

        Ok(ChannelScan { tag: channel.to_string(), result, steps })
    }

    /// Run one fit. `baseline_upper` sets the curve range for post-baseline steps.
    fn run_step(
        &self,
        ctx: &StepContext<'_, S::Data, S::Config>,
        step: &ScanStep,
        baseline_upper: Option<f64>,
        diagnostics: &mut Vec<ScanDiagnostic>,
    ) -> Result<(ScanStepResult, IntervalEstimate)> {
        let channel = ctx.channel;
        let label = step.label.to_string();
        let model = step.configure(ctx.model);
        let request = SolveRequest {
            data: ctx.data,
            config: ctx.model_config,
            model: &model,
            confidence_level: step.confidence_level,
        };
        let estimate = self.solver.solve(&request)?;

        let point = estimate.point_estimate;
        if !(point.is_finite() && point != 0.0) {
            return Err(Error::Computation(format!(
                "[{channel}] step '{label}': POI estimate is {point}, relative uncertainties are undefined"
            )));
        }
        let relative_error = estimate.parameter_error / point;
        if !relative_error.is_finite() {
            return Err(Error::Computation(format!(
                "[{channel}] step '{label}': POI error is {}, relative uncertainty is not finite",
                estimate.parameter_error
            )));
        }

        let (mut lower_limit, mut upper_limit) = (estimate.lower_limit, estimate.upper_limit);
        if lower_limit == upper_limit {
            lower_limit = (1.0 - relative_error) * point;
            upper_limit = (1.0 + relative_error) * point;
            log::debug!(
                "[{channel}] step '{label}': degenerate interval, using [{lower_limit}, {upper_limit}]"
            );
            diagnostics.push(ScanDiagnostic::DegenerateInterval { step: label.clone(), relative_error });
        }
        log::debug!(
            "[{channel}] step '{label}': r = {point} [{lower_limit}, {upper_limit}], rel. err. {relative_error}"
        );

        let wants_curve =
            self.config.extract_curves && matches!(step.label, StepLabel::Total | StepLabel::Stat);
        let curve = if wants_curve {
            let grid = CurveGrid::for_upper_limit(baseline_upper.unwrap_or(upper_limit));
            self.extract_curve(channel, &label, &request, &estimate, &grid)
        } else {
            None
        };

        let result =
            ScanStepResult { label, point_estimate: point, lower_limit, upper_limit, relative_error, curve };
        Ok((result, estimate))
    }

    /// Best-effort: failures and missing curves are logged, never propagated.
    fn extract_curve(
        &self,
        channel: &str,
        label: &str,
        request: &SolveRequest<'_, S::Data, S::Config>,
        estimate: &IntervalEstimate,
        grid: &CurveGrid,
    ) -> Option<Vec<CurvePoint>> {
        match self.solver.sample_curves(request, estimate, grid) {
            Ok(curves) => {
                let nll = curves.into_iter().find(|c| c.kind == CurveKind::ProfileNll);
                if nll.is_none() {
                    log::debug!("[{channel}] step '{label}': solver exposed no likelihood curve");
                }
                nll.map(|c| c.points)
            }
            Err(e) => {
                log::warn!("[{channel}] step '{label}': likelihood curve extraction failed: {e}");
                None
            }
        }
    }
}
