//! Scan configuration threaded into the engine entry points.

use pd_core::{Error, ResourceNames, Result};
use serde::{Deserialize, Serialize};

/// Default confidence level of the profile-likelihood interval.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.68;

/// Configuration of a nuisance scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Confidence level in (0, 1).
    pub confidence_level: f64,
    /// Workspace object and group names.
    pub names: ResourceNames,
    /// Extract likelihood curves at the `total` and `stat` steps.
    pub extract_curves: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            names: ResourceNames::default(),
            extract_curves: true,
        }
    }
}

impl ScanConfig {
    /// Builder: set the confidence level.
    pub fn with_confidence_level(mut self, cl: f64) -> Self {
        self.confidence_level = cl;
        self
    }

    /// Builder: enable or disable curve extraction.
    pub fn with_curves(mut self, extract: bool) -> Self {
        self.extract_curves = extract;
        self
    }

    /// Check the configuration before any fit runs.
    pub fn validate(&self) -> Result<()> {
        let cl = self.confidence_level;
        if !(cl.is_finite() && cl > 0.0 && cl < 1.0) {
            return Err(Error::Validation(format!("confidence level must lie in (0, 1), got {cl}")));
        }
        let n = &self.names;
        let all = [
            &n.workspace,
            &n.dataset,
            &n.model_config,
            &n.observables,
            &n.poi,
            &n.nuisances,
            &n.global_observables,
        ];
        if all.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::Validation("resource names must not be empty".to_string()));
        }
        Ok(())
    }
}
