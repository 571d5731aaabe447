//! Parameter ranges used to generate and analyze Saltelli samples

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::error::SensitivityError;
use crate::model::{Value, ValueMap};

/// A parameter that is either held fixed or varied over `[low, high]`
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpec {
    Fixed(Value),
    Range(f64, f64),
}

/// Untagged wire form: a two-element numeric list is a range, anything else
/// a fixed value.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpec {
    Range([f64; 2]),
    Fixed(Value),
}

impl<'de> Deserialize<'de> for ParamSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSpec::deserialize(deserializer)? {
            RawSpec::Range([low, high]) => ParamSpec::Range(low, high),
            RawSpec::Fixed(value) => ParamSpec::Fixed(value),
        })
    }
}

/// Ordered mapping of parameter name to [`ParamSpec`].
///
/// Order matters: it fixes the column order of generated samples and the
/// row order of sensitivity tables, and two mappings with the same entries
/// in a different order are not equal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ParameterRanges {
    entries: IndexMap<String, ParamSpec>,
}

impl PartialEq for ParameterRanges {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

/// Variance decomposition problem: the varying parameters and their bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub names: Vec<String>,
    pub bounds: Vec<(f64, f64)>,
}

impl Problem {
    pub fn num_vars(&self) -> usize {
        self.names.len()
    }
}

impl ParameterRanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, name: &str, low: f64, high: f64) -> Self {
        self.insert(name, ParamSpec::Range(low, high));
        self
    }

    pub fn fixed(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, ParamSpec::Fixed(value.into()));
        self
    }

    /// Insert or replace a parameter, keeping its original position on replace.
    pub fn insert(&mut self, name: &str, spec: ParamSpec) {
        self.entries.insert(name.to_string(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamSpec)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The range parameters, in insertion order. Fixed parameters are left out.
    pub fn problem(&self) -> Result<Problem, SensitivityError> {
        let mut names = Vec::new();
        let mut bounds = Vec::new();
        for (name, spec) in &self.entries {
            if let ParamSpec::Range(low, high) = *spec {
                if low.is_nan() || high.is_nan() || low > high {
                    return Err(SensitivityError::InvalidRange {
                        name: name.clone(),
                        low,
                        high,
                    });
                }
                names.push(name.clone());
                bounds.push((low, high));
            }
        }
        if names.is_empty() {
            return Err(SensitivityError::NoRanges);
        }
        Ok(Problem { names, bounds })
    }

    /// The fixed parameters
    pub fn constants(&self) -> ValueMap {
        self.entries
            .iter()
            .filter_map(|(name, spec)| match spec {
                ParamSpec::Fixed(v) => Some((name.clone(), v.clone())),
                ParamSpec::Range(..) => None,
            })
            .collect()
    }
}
