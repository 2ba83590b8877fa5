//! Search space definition for hyperparameters
//!
//! Parameter order is load-bearing: samplers emit values positionally and the
//! reported best configuration is rendered in the order parameters were added.

use crate::error::{Result, TreeTuneError};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Type of parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    /// Continuous parameter, sampled uniformly (or log-uniformly) over [low, high)
    Float {
        low: f64,
        high: f64,
        log_scale: bool,
    },
    /// Integer parameter, sampled uniformly over [low, high] inclusive
    Int { low: i64, high: i64 },
}

/// A single hyperparameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParameterType,
}

impl Parameter {
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float {
                low,
                high,
                log_scale: false,
            },
        }
    }

    pub fn log_float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float {
                low,
                high,
                log_scale: true,
            },
        }
    }

    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Int { low, high },
        }
    }

    /// Sample a random value
    pub fn sample(&self, rng: &mut impl Rng) -> ParameterValue {
        match &self.param_type {
            ParameterType::Float { low, high, log_scale } => {
                let val = if *log_scale {
                    let log_low = low.ln();
                    let log_high = high.ln();
                    (rng.gen::<f64>() * (log_high - log_low) + log_low).exp()
                } else {
                    rng.gen::<f64>() * (high - low) + low
                };
                ParameterValue::Float(val)
            }
            ParameterType::Int { low, high } => {
                ParameterValue::Int(rng.gen_range(*low..=*high))
            }
        }
    }

    /// Check whether a value lies inside this parameter's bounds
    pub fn contains(&self, value: &ParameterValue) -> bool {
        match (&self.param_type, value) {
            (ParameterType::Float { low, high, .. }, ParameterValue::Float(v)) => {
                *v >= *low && *v <= *high
            }
            (ParameterType::Int { low, high }, ParameterValue::Int(v)) => {
                *v >= *low && *v <= *high
            }
            _ => false,
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = match &self.param_type {
            ParameterType::Float { low, high, log_scale } => {
                low < high && (!log_scale || *low > 0.0)
            }
            ParameterType::Int { low, high } => low <= high,
        };
        if ok {
            Ok(())
        } else {
            Err(TreeTuneError::InvalidParameter {
                name: self.name.clone(),
                value: format!("{:?}", self.param_type),
                reason: "bounds must satisfy low < high (and low > 0 for log scale)".to_string(),
            })
        }
    }
}

/// Sampled parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
}

impl ParameterValue {
    pub fn as_float(&self) -> f64 {
        match self {
            ParameterValue::Float(v) => *v,
            ParameterValue::Int(v) => *v as f64,
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            ParameterValue::Int(v) => *v,
            ParameterValue::Float(v) => v.round() as i64,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Int(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered search space for hyperparameter optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::float(name, low, high))
    }

    pub fn log_float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::log_float(name, low, high))
    }

    pub fn int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(Parameter::int(name, low, high))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Parameter names, in the order they were added
    pub fn param_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    /// Reject empty spaces and inverted bounds
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(TreeTuneError::ConfigError(
                "search space has no parameters".to_string(),
            ));
        }
        for param in &self.parameters {
            param.validate()?;
        }
        Ok(())
    }

    /// Sample one value per parameter, in parameter order
    pub fn sample(&self, rng: &mut impl Rng) -> Vec<ParameterValue> {
        self.parameters.iter().map(|p| p.sample(rng)).collect()
    }

    /// Pair a positional value vector with parameter names.
    ///
    /// The vector length must match the space exactly; anything else would
    /// silently shift every value onto the wrong parameter.
    pub fn zip_params(&self, values: &[ParameterValue]) -> Result<TrialParams> {
        if values.len() != self.parameters.len() {
            return Err(TreeTuneError::ConfigError(format!(
                "expected {} parameter values, got {}",
                self.parameters.len(),
                values.len()
            )));
        }
        Ok(self
            .parameters
            .iter()
            .zip(values.iter())
            .map(|(p, v)| (p.name.clone(), v.clone()))
            .collect())
    }

    /// Check a positional value vector against every parameter's bounds
    pub fn contains(&self, values: &[ParameterValue]) -> bool {
        values.len() == self.parameters.len()
            && self
                .parameters
                .iter()
                .zip(values.iter())
                .all(|(p, v)| p.contains(v))
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

/// Named view of one sampled configuration
pub type TrialParams = HashMap<String, ParameterValue>;
