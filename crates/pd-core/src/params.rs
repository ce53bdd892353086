//! Named parameters and ordered parameter sets.

use crate::{Error, Result};

/// A single real-valued model parameter (POI, nuisance, observable or global observable).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Unique name.
    pub name: String,
    /// Display name used in pull listings. Defaults to `name`.
    pub title: String,
    /// Current value.
    pub value: f64,
    /// Current error estimate.
    pub error: f64,
    /// Held fixed (`true`) or floating (`false`) in the next fit.
    pub constant: bool,
    /// Allowed range (min, max). Unbounded sides are infinite.
    pub bounds: (f64, f64),
}

impl Parameter {
    /// Floating, unbounded parameter with zero error.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            value,
            error: 0.0,
            constant: false,
            bounds: (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    /// Builder: set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set the error estimate.
    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    /// Builder: set the constant flag.
    pub fn with_constant(mut self, constant: bool) -> Self {
        self.constant = constant;
        self
    }

    /// Builder: set the allowed range.
    pub fn with_bounds(mut self, lo: f64, hi: f64) -> Self {
        self.bounds = (lo, hi);
        self
    }

    /// Clamp `x` into the parameter range.
    pub fn clamp(&self, x: f64) -> f64 {
        x.max(self.bounds.0).min(self.bounds.1)
    }
}

/// Ordered set of uniquely named parameters.
///
/// Order is discovery order and is preserved by every operation; lookups by name
/// return `None` instead of panicking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    /// Build a set, rejecting duplicate names.
    pub fn new(params: Vec<Parameter>) -> Result<Self> {
        for (i, p) in params.iter().enumerate() {
            if params[..i].iter().any(|q| q.name == p.name) {
                return Err(Error::Validation(format!("duplicate parameter name '{}'", p.name)));
            }
        }
        Ok(Self { params })
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// `true` if the set has no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Mutable lookup by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    /// `true` if a parameter with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// First parameter in discovery order.
    pub fn first(&self) -> Option<&Parameter> {
        self.params.first()
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    /// Mutable iteration in discovery order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Parameter> {
        self.params.iter_mut()
    }

    /// Parameter names in discovery order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_set_preserves_order() {
        let set = ParameterSet::new(vec![
            Parameter::new("pu", 0.0),
            Parameter::new("jes", 0.0),
            Parameter::new("lumi", 0.0),
        ])
        .unwrap();
        assert_eq!(set.names(), vec!["pu", "jes", "lumi"]);
        assert_eq!(set.first().unwrap().name, "pu");
    }

    #[test]
    fn test_parameter_set_rejects_duplicates() {
        let err = ParameterSet::new(vec![Parameter::new("jes", 0.0), Parameter::new("jes", 1.0)])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate parameter name 'jes'"));
    }

    #[test]
    fn test_lookup_not_found() {
        let set = ParameterSet::new(vec![Parameter::new("jes", 0.0)]).unwrap();
        assert!(set.get("pu").is_none());
        assert!(!set.contains("pu"));
    }

    #[test]
    fn test_clamp_to_bounds() {
        let p = Parameter::new("r", 1.0).with_bounds(0.0, 5.0);
        assert_eq!(p.clamp(-1.0), 0.0);
        assert_eq!(p.clamp(7.0), 5.0);
        assert_eq!(p.clamp(2.5), 2.5);
        assert_eq!(p.title, "r");
    }
}
