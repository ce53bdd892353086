//! In-memory workspace built from [`WorkspaceSpec`].

use std::collections::BTreeMap;

use pd_core::{Error, Parameter, ParameterSet, Result, Workspace};

use crate::schema::{DatasetSpec, ModelConfigSpec, VariableSpec, WorkspaceSpec};

const SYMMETRY_TOL: f64 = 1e-9;

/// Observed central values of the parameter estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Dataset name.
    pub name: String,
    values: BTreeMap<String, f64>,
}

impl Dataset {
    /// Build a dataset, rejecting non-finite values.
    pub fn new(name: impl Into<String>, values: BTreeMap<String, f64>) -> Result<Self> {
        let name = name.into();
        if let Some((k, v)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Validation(format!("dataset '{name}': value for '{k}' is not finite ({v})")));
        }
        Ok(Self { name, values })
    }

    /// Observed value for a parameter.
    pub fn value(&self, parameter: &str) -> Option<f64> {
        self.values.get(parameter).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if the dataset has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Joint Gaussian approximation of the parameter estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianModelConfig {
    /// Config name.
    pub name: String,
    parameters: Vec<String>,
    /// Row-major N×N covariance.
    covariance: Vec<f64>,
}

impl GaussianModelConfig {
    /// Build from a covariance matrix given as rows.
    pub fn new(name: impl Into<String>, parameters: Vec<String>, covariance: &[Vec<f64>]) -> Result<Self> {
        let name = name.into();
        let n = parameters.len();
        if n == 0 {
            return Err(Error::Validation(format!("model config '{name}': no parameters")));
        }
        for (i, p) in parameters.iter().enumerate() {
            if parameters[..i].contains(p) {
                return Err(Error::Validation(format!("model config '{name}': duplicate parameter '{p}'")));
            }
        }
        if covariance.len() != n || covariance.iter().any(|row| row.len() != n) {
            return Err(Error::Validation(format!(
                "model config '{name}': covariance must be {n}x{n} to match the parameter list"
            )));
        }

        let flat: Vec<f64> = covariance.iter().flatten().copied().collect();
        if flat.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation(format!("model config '{name}': covariance has non-finite entries")));
        }
        for i in 0..n {
            if flat[i * n + i] < 0.0 {
                return Err(Error::Validation(format!(
                    "model config '{name}': negative variance for '{}'",
                    parameters[i]
                )));
            }
            for j in (i + 1)..n {
                let (a, b) = (flat[i * n + j], flat[j * n + i]);
                if (a - b).abs() > SYMMETRY_TOL * a.abs().max(b.abs()).max(1.0) {
                    return Err(Error::Validation(format!(
                        "model config '{name}': covariance is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }

        Ok(Self { name, parameters, covariance: flat })
    }

    /// Build from per-parameter errors and a correlation matrix.
    pub fn from_correlation(
        name: impl Into<String>,
        parameters: Vec<String>,
        errors: &[f64],
        correlation: &[Vec<f64>],
    ) -> Result<Self> {
        let name = name.into();
        let n = parameters.len();
        if errors.len() != n {
            return Err(Error::Validation(format!(
                "model config '{name}': expected {n} errors, got {}",
                errors.len()
            )));
        }
        if let Some(e) = errors.iter().find(|e| !(e.is_finite() && **e >= 0.0)) {
            return Err(Error::Validation(format!("model config '{name}': invalid error {e}")));
        }
        if correlation.len() != n || correlation.iter().any(|row| row.len() != n) {
            return Err(Error::Validation(format!(
                "model config '{name}': correlation must be {n}x{n} to match the parameter list"
            )));
        }
        for (i, row) in correlation.iter().enumerate() {
            if (row[i] - 1.0).abs() > SYMMETRY_TOL {
                return Err(Error::Validation(format!(
                    "model config '{name}': correlation diagonal must be 1 at {i}"
                )));
            }
            if row.iter().any(|r| !(-1.0..=1.0).contains(r)) {
                return Err(Error::Validation(format!(
                    "model config '{name}': correlation entries must lie in [-1, 1] (row {i})"
                )));
            }
        }

        let covariance: Vec<Vec<f64>> = correlation
            .iter()
            .enumerate()
            .map(|(i, row)| row.iter().enumerate().map(|(j, r)| r * errors[i] * errors[j]).collect())
            .collect();
        Self::new(name, parameters, &covariance)
    }

    /// Parameter order of the matrix.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.parameters.len()
    }

    /// Position of `parameter` in the matrix.
    pub fn index_of(&self, parameter: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p == parameter)
    }

    /// Covariance element (i, j).
    pub fn covariance(&self, i: usize, j: usize) -> f64 {
        self.covariance[i * self.dim() + j]
    }
}

impl TryFrom<&ModelConfigSpec> for GaussianModelConfig {
    type Error = Error;

    fn try_from(spec: &ModelConfigSpec) -> Result<Self> {
        match spec {
            ModelConfigSpec::Gaussian { name, parameters, covariance } => {
                GaussianModelConfig::new(name.clone(), parameters.clone(), covariance)
            }
            ModelConfigSpec::GaussianCorrelation { name, parameters, errors, correlation } => {
                GaussianModelConfig::from_correlation(name.clone(), parameters.clone(), errors, correlation)
            }
        }
    }
}

/// Workspace loaded from JSON.
#[derive(Debug, Clone)]
pub struct JsonWorkspace {
    name: String,
    sets: BTreeMap<String, ParameterSet>,
    data: Vec<Dataset>,
    configs: Vec<GaussianModelConfig>,
}

fn to_parameter(v: &VariableSpec) -> Result<Parameter> {
    if !v.value.is_finite() {
        return Err(Error::Validation(format!("variable '{}': value is not finite", v.name)));
    }
    let lo = v.min.unwrap_or(f64::NEG_INFINITY);
    let hi = v.max.unwrap_or(f64::INFINITY);
    if lo > hi {
        return Err(Error::Validation(format!("variable '{}': min > max", v.name)));
    }
    let mut p = Parameter::new(v.name.clone(), v.value)
        .with_error(v.error)
        .with_constant(v.constant)
        .with_bounds(lo, hi);
    if let Some(title) = &v.title {
        p = p.with_title(title.clone());
    }
    Ok(p)
}

fn to_dataset(d: &DatasetSpec) -> Result<Dataset> {
    Dataset::new(d.name.clone(), d.values.clone())
}

impl JsonWorkspace {
    /// Build and validate a workspace from its JSON spec.
    pub fn from_spec(spec: &WorkspaceSpec) -> Result<Self> {
        let variables = ParameterSet::new(spec.variables.iter().map(to_parameter).collect::<Result<Vec<_>>>()?)
            .map_err(|e| Error::Validation(format!("workspace '{}': {e}", spec.name)))?;

        let mut sets = BTreeMap::new();
        for (group, members) in &spec.sets {
            let mut params = Vec::with_capacity(members.len());
            for m in members {
                let p = variables.get(m).ok_or_else(|| {
                    Error::Validation(format!(
                        "workspace '{}': set '{group}' refers to undeclared variable '{m}'",
                        spec.name
                    ))
                })?;
                params.push(p.clone());
            }
            sets.insert(group.clone(), ParameterSet::new(params)?);
        }

        let data = spec.data.iter().map(to_dataset).collect::<Result<Vec<_>>>()?;
        for (i, d) in data.iter().enumerate() {
            if data[..i].iter().any(|o| o.name == d.name) {
                return Err(Error::Validation(format!(
                    "workspace '{}': duplicate dataset '{}'",
                    spec.name, d.name
                )));
            }
        }

        let configs =
            spec.model_configs.iter().map(GaussianModelConfig::try_from).collect::<Result<Vec<_>>>()?;
        for (i, c) in configs.iter().enumerate() {
            if configs[..i].iter().any(|o| o.name == c.name) {
                return Err(Error::Validation(format!(
                    "workspace '{}': duplicate model config '{}'",
                    spec.name, c.name
                )));
            }
        }

        log::debug!(
            "workspace '{}': {} sets, {} datasets, {} model configs",
            spec.name,
            sets.len(),
            data.len(),
            configs.len()
        );

        Ok(Self { name: spec.name.clone(), sets, data, configs })
    }
}

impl Workspace for JsonWorkspace {
    type Data = Dataset;
    type Config = GaussianModelConfig;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_set(&self, name: &str) -> Option<&ParameterSet> {
        self.sets.get(name)
    }

    fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.data.iter().find(|d| d.name == name)
    }

    fn model_config(&self, name: &str) -> Option<&GaussianModelConfig> {
        self.configs.iter().find(|c| c.name == name)
    }

    fn contents(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (group, set) in &self.sets {
            out.push(format!("set {group}: ({})", set.names().join(",")));
        }
        for d in &self.data {
            out.push(format!("data {} ({} entries)", d.name, d.len()));
        }
        for c in &self.configs {
            out.push(format!("model config {} ({} parameters)", c.name, c.dim()));
        }
        out
    }
}
