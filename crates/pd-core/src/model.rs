//! Model binding: the four parameter groups a scannable model needs.

use crate::params::{Parameter, ParameterSet};
use crate::traits::Workspace;
use crate::types::ResourceNames;
use crate::{Error, Result};

/// Observables, POI, nuisances and global observables resolved from a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Observables.
    pub observables: ParameterSet,
    /// Parameter of interest (first member of the POI group; others are ignored).
    pub poi: Parameter,
    /// Nuisance parameters in discovery order.
    pub nuisances: ParameterSet,
    /// Global observables.
    pub global_observables: ParameterSet,
}

impl Model {
    /// Resolve the four groups from `workspace` using `names`.
    ///
    /// Absent or empty groups are reported together in [`Error::IncompleteModel`].
    pub fn from_workspace<W: Workspace + ?Sized>(workspace: &W, names: &ResourceNames) -> Result<Self> {
        let lookup = |group: &str| workspace.parameter_set(group).filter(|s| !s.is_empty());

        let observables = lookup(&names.observables);
        let pois = lookup(&names.poi);
        let nuisances = lookup(&names.nuisances);
        let global_observables = lookup(&names.global_observables);

        match (observables, pois.and_then(|s| s.first()), nuisances, global_observables) {
            (Some(observables), Some(poi), Some(nuisances), Some(global_observables)) => Ok(Self {
                observables: observables.clone(),
                poi: poi.clone(),
                nuisances: nuisances.clone(),
                global_observables: global_observables.clone(),
            }),
            (o, p, n, g) => {
                let missing = [
                    (o.is_none(), &names.observables),
                    (p.is_none(), &names.poi),
                    (n.is_none(), &names.nuisances),
                    (g.is_none(), &names.global_observables),
                ]
                .into_iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, name)| name.clone())
                .collect();
                Err(Error::IncompleteModel { workspace: workspace.name().to_string(), missing })
            }
        }
    }

    /// The parameter of interest.
    pub fn poi(&self) -> &Parameter {
        &self.poi
    }
}
