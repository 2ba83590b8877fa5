//! Sampling strategies for sequential optimization

use crate::error::{Result, TreeTuneError};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::gaussian_process::{AcquisitionFunction, GaussianProcess, KernelType};
use super::search_space::{Parameter, ParameterType, ParameterValue, SearchSpace};

/// Type of sampler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerType {
    /// Uniform random sampling
    Random,
    /// Gaussian-process guided sampling after a random startup phase
    GaussianProcess,
}

/// Trait for candidate samplers.
///
/// History entries pair a positional value vector with its observed objective
/// value. Samplers return values in search-space parameter order.
pub trait Sampler: Send {
    fn sample(
        &mut self,
        search_space: &SearchSpace,
        history: &[(Vec<ParameterValue>, f64)],
    ) -> Result<Vec<ParameterValue>>;
}

/// Uniform random sampler
#[derive(Debug)]
pub struct RandomSampler {
    rng: Xoshiro256PlusPlus,
}

impl RandomSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Self { rng }
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &mut self,
        search_space: &SearchSpace,
        _history: &[(Vec<ParameterValue>, f64)],
    ) -> Result<Vec<ParameterValue>> {
        Ok(search_space.sample(&mut self.rng))
    }
}

/// Gaussian-process sampler.
///
/// Samples uniformly until `n_startup_trials` observations exist, then fits a
/// GP surrogate on the history (inputs scaled to the unit cube) and proposes
/// the best of `n_candidates` random candidates under the acquisition
/// function.
#[derive(Debug)]
pub struct GpSampler {
    rng: Xoshiro256PlusPlus,
    kernel: KernelType,
    acquisition: AcquisitionFunction,
    noise: f64,
    n_startup_trials: usize,
    n_candidates: usize,
}

impl GpSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Self {
            rng,
            kernel: KernelType::default(),
            acquisition: AcquisitionFunction::default(),
            noise: 1e-6,
            n_startup_trials: 10,
            n_candidates: 1000,
        }
    }

    pub fn with_kernel(mut self, kernel: KernelType) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_acquisition(mut self, acquisition: AcquisitionFunction) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn with_n_startup(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    pub fn with_n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = n.max(1);
        self
    }
}

impl Sampler for GpSampler {
    fn sample(
        &mut self,
        search_space: &SearchSpace,
        history: &[(Vec<ParameterValue>, f64)],
    ) -> Result<Vec<ParameterValue>> {
        if history.len() < self.n_startup_trials {
            return Ok(search_space.sample(&mut self.rng));
        }

        let n_params = search_space.len();
        let n_obs = history.len();

        // Encode observed configurations into the unit cube
        let mut x_data = Vec::with_capacity(n_obs * n_params);
        let mut y_data = Vec::with_capacity(n_obs);
        for (values, y) in history {
            if values.len() != n_params {
                return Err(TreeTuneError::ConfigError(format!(
                    "history entry has {} values for a {}-parameter space",
                    values.len(),
                    n_params
                )));
            }
            for (param, value) in search_space.parameters().iter().zip(values.iter()) {
                x_data.push(encode_unit(param, value));
            }
            y_data.push(*y);
        }
        let best_y = y_data.iter().copied().fold(f64::INFINITY, f64::min);

        let x_train = Array2::from_shape_vec((n_obs, n_params), x_data)?;
        let y_train = Array1::from_vec(y_data);

        let mut gp = GaussianProcess::new(self.kernel.clone()).with_noise(self.noise);
        gp.fit(x_train, y_train)?;

        // Score one batch of random candidates under the acquisition function
        let candidates: Vec<Vec<ParameterValue>> = (0..self.n_candidates)
            .map(|_| search_space.sample(&mut self.rng))
            .collect();

        let mut encoded = Vec::with_capacity(self.n_candidates * n_params);
        for candidate in &candidates {
            for (param, value) in search_space.parameters().iter().zip(candidate.iter()) {
                encoded.push(encode_unit(param, value));
            }
        }
        let x_cand = Array2::from_shape_vec((self.n_candidates, n_params), encoded)?;
        let (mean, var) = gp.predict(&x_cand)?;

        let mut best_idx = 0;
        let mut best_acq = f64::NEG_INFINITY;
        for i in 0..self.n_candidates {
            let acq = self.acquisition.evaluate(mean[i], var[i].sqrt(), best_y);
            if acq > best_acq {
                best_acq = acq;
                best_idx = i;
            }
        }

        Ok(candidates.into_iter().nth(best_idx).unwrap_or_else(|| search_space.sample(&mut self.rng)))
    }
}

/// Map a value into [0, 1] using its parameter's bounds
fn encode_unit(param: &Parameter, value: &ParameterValue) -> f64 {
    match &param.param_type {
        ParameterType::Float { low, high, log_scale } => {
            let v = value.as_float();
            if *log_scale {
                (v.ln() - low.ln()) / (high.ln() - low.ln())
            } else {
                (v - low) / (high - low)
            }
        }
        ParameterType::Int { low, high } => {
            if high == low {
                0.5
            } else {
                (value.as_float() - *low as f64) / ((*high - *low) as f64)
            }
        }
    }
}

/// Create a sampler from its type
pub fn create_sampler(
    sampler_type: SamplerType,
    seed: Option<u64>,
    n_startup_trials: usize,
    acquisition: AcquisitionFunction,
) -> Box<dyn Sampler> {
    match sampler_type {
        SamplerType::Random => Box::new(RandomSampler::new(seed)),
        SamplerType::GaussianProcess => Box::new(
            GpSampler::new(seed)
                .with_n_startup(n_startup_trials)
                .with_acquisition(acquisition),
        ),
    }
}
