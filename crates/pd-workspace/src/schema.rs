//! Workspace JSON schema types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Workspace file: one or more named workspaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceFile {
    /// Workspaces
    pub workspaces: Vec<WorkspaceSpec>,
    /// Schema version
    #[serde(default)]
    pub version: Option<String>,
}

/// A single workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    /// Workspace name
    pub name: String,
    /// Declared variables
    pub variables: Vec<VariableSpec>,
    /// Named parameter groups (group name -> ordered member names)
    #[serde(default)]
    pub sets: BTreeMap<String, Vec<String>>,
    /// Observed datasets
    #[serde(default)]
    pub data: Vec<DatasetSpec>,
    /// Model configurations
    #[serde(default)]
    pub model_configs: Vec<ModelConfigSpec>,
}

/// Real-valued variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Variable name
    pub name: String,
    /// Display title (defaults to the name)
    #[serde(default)]
    pub title: Option<String>,
    /// Initial value
    pub value: f64,
    /// Initial error
    #[serde(default)]
    pub error: f64,
    /// Held constant by default
    #[serde(default)]
    pub constant: bool,
    /// Lower bound
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound
    #[serde(default)]
    pub max: Option<f64>,
}

/// Observed central values of the parameter estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Dataset name
    pub name: String,
    /// Parameter name -> observed estimate
    pub values: BTreeMap<String, f64>,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelConfigSpec {
    /// Gaussian approximation given by a full covariance matrix.
    #[serde(rename = "gaussian")]
    Gaussian {
        /// Config name.
        name: String,
        /// Parameter order of the matrix.
        parameters: Vec<String>,
        /// Covariance matrix (rows).
        covariance: Vec<Vec<f64>>,
    },

    /// Gaussian approximation given by per-parameter errors and a correlation matrix.
    #[serde(rename = "gaussian_correlation")]
    GaussianCorrelation {
        /// Config name.
        name: String,
        /// Parameter order of the matrix.
        parameters: Vec<String>,
        /// Per-parameter errors (σ).
        errors: Vec<f64>,
        /// Correlation matrix (rows).
        correlation: Vec<Vec<f64>>,
    },
}

impl ModelConfigSpec {
    /// Config name.
    pub fn name(&self) -> &str {
        match self {
            ModelConfigSpec::Gaussian { name, .. } => name,
            ModelConfigSpec::GaussianCorrelation { name, .. } => name,
        }
    }
}
