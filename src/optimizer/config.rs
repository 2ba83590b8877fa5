//! Optimization configuration

use crate::error::{Result, TreeTuneError};
use serde::{Deserialize, Serialize};

use super::gaussian_process::AcquisitionFunction;
use super::samplers::SamplerType;

/// Configuration for sequential minimization.
///
/// The optimizer always minimizes; callers negate scores they want maximized.
/// With the defaults every call is a random sample, since the startup phase
/// covers the whole budget. Lower `n_random_starts` below `n_calls` to give
/// the Gaussian process room to propose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Total number of objective evaluations
    pub n_calls: usize,

    /// Random samples drawn before model-guided proposals begin
    pub n_random_starts: usize,

    /// Sampler type
    pub sampler: SamplerType,

    /// Acquisition function for model-guided proposals
    pub acquisition: AcquisitionFunction,

    /// Random seed
    pub random_state: Option<u64>,

    /// Print per-trial progress
    pub verbose: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            n_calls: 10,
            n_random_starts: 10,
            sampler: SamplerType::GaussianProcess,
            acquisition: AcquisitionFunction::EI,
            random_state: None,
            verbose: true,
        }
    }
}

impl OptimizationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_calls(mut self, n: usize) -> Self {
        self.n_calls = n;
        self
    }

    pub fn with_n_random_starts(mut self, n: usize) -> Self {
        self.n_random_starts = n;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerType) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_acquisition(mut self, acquisition: AcquisitionFunction) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_calls == 0 {
            return Err(TreeTuneError::ConfigError(
                "n_calls must be at least 1".to_string(),
            ));
        }
        if self.n_random_starts == 0 {
            return Err(TreeTuneError::ConfigError(
                "n_random_starts must be at least 1, the surrogate needs observations".to_string(),
            ));
        }
        Ok(())
    }
}
